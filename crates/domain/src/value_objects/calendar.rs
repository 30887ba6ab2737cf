//! Imperial calendar value objects
//!
//! Campaign time is kept as an Imperial date: a year, a 1-based day of a fixed
//! 365-day year, and a 24-hour clock. There are no months and no leap years.
//!
//! The persisted form is `YYYY-DDD` or `YYYY-DDD HH:MM`, which is the only data
//! contract the clock shares with the record store. Every valid value
//! round-trips through that string losslessly.
//!
//! Key items:
//! - `ImperialTimestamp` - validated point on the calendar
//! - `parse` / `format` - string conversion
//! - `advance` - carry-aware addition of hours and minutes
//! - `hours_between` - coarse signed hour distance (minutes ignored)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Days in every Imperial year.
pub const DAYS_PER_YEAR: u32 = 365;

const HOURS_PER_DAY: u64 = 24;
const MINUTES_PER_HOUR: u64 = 60;

// ============================================================================
// ImperialTimestamp
// ============================================================================

/// A point on the Imperial calendar.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImperialTimestamp {
    year: u32,
    day: u16,
    hour: u8,
    minute: u8,
}

impl ImperialTimestamp {
    /// The last representable minute. `advance` stops here.
    pub const LATEST: Self = Self {
        year: u32::MAX,
        day: DAYS_PER_YEAR as u16,
        hour: 23,
        minute: 59,
    };

    /// Create a validated timestamp.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the day is outside 1..=365, the
    /// hour is above 23 or the minute is above 59.
    pub fn new(year: u32, day: u16, hour: u8, minute: u8) -> Result<Self, DomainError> {
        check_fields(day, hour, minute).map_err(DomainError::validation)?;
        Ok(Self {
            year,
            day,
            hour,
            minute,
        })
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    /// Day of the year, 1-based.
    pub fn day(&self) -> u16 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Returns this timestamp moved forward by the given hours and minutes.
    pub fn advance(self, hours: u32, minutes: u32) -> Self {
        advance(self, hours, minutes)
    }

    /// Signed whole hours from `self` until `later` (negative if `later` is earlier).
    pub fn hours_until(&self, later: &ImperialTimestamp) -> i64 {
        hours_between(self, later)
    }

    /// The date part only, e.g. `1105-042`.
    pub fn date_string(&self) -> String {
        format!("{:04}-{:03}", self.year, self.day)
    }

    fn total_minutes(&self) -> u64 {
        let days = u64::from(self.year) * u64::from(DAYS_PER_YEAR) + u64::from(self.day - 1);
        (days * HOURS_PER_DAY + u64::from(self.hour)) * MINUTES_PER_HOUR + u64::from(self.minute)
    }

    /// Saturates at the last minute of year `u32::MAX`.
    fn from_total_minutes(total: u64) -> Self {
        if total > Self::LATEST.total_minutes() {
            return Self::LATEST;
        }
        let minute = (total % MINUTES_PER_HOUR) as u8;
        let hours = total / MINUTES_PER_HOUR;
        let hour = (hours % HOURS_PER_DAY) as u8;
        let days = hours / HOURS_PER_DAY;
        let day = (days % u64::from(DAYS_PER_YEAR)) as u16 + 1;
        // Bounded by LATEST above
        let year = (days / u64::from(DAYS_PER_YEAR)) as u32;
        Self {
            year,
            day,
            hour,
            minute,
        }
    }

    fn linear_hours(&self) -> i64 {
        i64::from(self.year) * i64::from(DAYS_PER_YEAR) * 24
            + (i64::from(self.day) - 1) * 24
            + i64::from(self.hour)
    }
}

impl fmt::Display for ImperialTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self.year, self.day, self.hour, self.minute))
    }
}

impl FromStr for ImperialTimestamp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl TryFrom<String> for ImperialTimestamp {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse(&s)
    }
}

impl From<ImperialTimestamp> for String {
    fn from(ts: ImperialTimestamp) -> String {
        ts.to_string()
    }
}

// ============================================================================
// Calendar operations
// ============================================================================

/// Parse `YYYY-DDD` or `YYYY-DDD HH:MM`.
///
/// The year takes at least four digits, the day exactly three, hour and minute
/// exactly two. A date without a time is midnight.
///
/// # Errors
///
/// Returns `DomainError::MalformedTimestamp` if the input deviates from the
/// format in any way, including surrounding whitespace and out-of-range fields.
pub fn parse(input: &str) -> Result<ImperialTimestamp, DomainError> {
    let malformed = |reason: &str| DomainError::malformed_timestamp(input, reason);

    let (date, time) = match input.split_once(' ') {
        Some((date, time)) => (date, Some(time)),
        None => (input, None),
    };

    let (year_part, day_part) = date
        .split_once('-')
        .ok_or_else(|| malformed("expected YYYY-DDD"))?;
    if year_part.len() < 4 {
        return Err(malformed("year must have at least four digits"));
    }
    let year = parse_digits(year_part).ok_or_else(|| malformed("year is not a number"))?;
    if day_part.len() != 3 {
        return Err(malformed("day must have exactly three digits"));
    }
    let day = parse_digits(day_part).ok_or_else(|| malformed("day is not a number"))?;

    let (hour, minute) = match time {
        None => (0, 0),
        Some(time) => {
            let (hour_part, minute_part) = time
                .split_once(':')
                .ok_or_else(|| malformed("expected HH:MM after the date"))?;
            if hour_part.len() != 2 || minute_part.len() != 2 {
                return Err(malformed("hour and minute must have exactly two digits"));
            }
            let hour = parse_digits(hour_part).ok_or_else(|| malformed("hour is not a number"))?;
            let minute =
                parse_digits(minute_part).ok_or_else(|| malformed("minute is not a number"))?;
            (hour, minute)
        }
    };

    // Widths above bound every field, so the narrowing casts are lossless.
    check_fields(day as u16, hour as u8, minute as u8).map_err(|reason| malformed(&reason))?;
    Ok(ImperialTimestamp {
        year,
        day: day as u16,
        hour: hour as u8,
        minute: minute as u8,
    })
}

/// Format calendar fields as `YYYY-DDD HH:MM`.
pub fn format(year: u32, day: u16, hour: u8, minute: u8) -> String {
    format!("{:04}-{:03} {:02}:{:02}", year, day, hour, minute)
}

/// Add minutes and hours, carrying into days and years.
///
/// Day 366 of year Y becomes day 1 of year Y+1. Results past
/// `ImperialTimestamp::LATEST` saturate to it.
pub fn advance(ts: ImperialTimestamp, hours: u32, minutes: u32) -> ImperialTimestamp {
    let total = ts.total_minutes() + u64::from(minutes) + u64::from(hours) * MINUTES_PER_HOUR;
    ImperialTimestamp::from_total_minutes(total)
}

/// Signed hour difference `b - a`, ignoring minutes.
pub fn hours_between(a: &ImperialTimestamp, b: &ImperialTimestamp) -> i64 {
    b.linear_hours() - a.linear_hours()
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn check_fields(day: u16, hour: u8, minute: u8) -> Result<(), String> {
    if day == 0 || u32::from(day) > DAYS_PER_YEAR {
        return Err(format!("day {} is outside 1..={}", day, DAYS_PER_YEAR));
    }
    if hour > 23 {
        return Err(format!("hour {} is outside 0..=23", hour));
    }
    if minute > 59 {
        return Err(format!("minute {} is outside 0..=59", minute));
    }
    Ok(())
}
