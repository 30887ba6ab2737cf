//! Campaign aggregate - One ongoing game with its own calendar
//!
//! The campaign owns the shared current date and the party's current star
//! system. Vessels reference it by `CampaignId`.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{ImperialTimestamp, SystemLocation};
use crate::CampaignId;

/// A multiplayer campaign.
///
/// # Invariants
///
/// - `name` is never empty
/// - `current_date` only moves forward through `advance_minutes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    id: CampaignId,
    name: String,
    current_date: ImperialTimestamp,
    location: SystemLocation,
}

impl Campaign {
    /// Create a campaign starting on `start_date` in `location`.
    pub fn new(
        name: impl Into<String>,
        start_date: ImperialTimestamp,
        location: SystemLocation,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Campaign name cannot be empty"));
        }
        Ok(Self {
            id: CampaignId::new(),
            name,
            current_date: start_date,
            location,
        })
    }

    pub fn with_id(mut self, id: CampaignId) -> Self {
        self.id = id;
        self
    }

    #[inline]
    pub fn id(&self) -> CampaignId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn current_date(&self) -> ImperialTimestamp {
        self.current_date
    }

    #[inline]
    pub fn location(&self) -> &SystemLocation {
        &self.location
    }

    /// Move the calendar forward, returning `(previous, new)`.
    pub fn advance_minutes(&mut self, minutes: u32) -> (ImperialTimestamp, ImperialTimestamp) {
        let previous = self.current_date;
        self.current_date = previous.advance(0, minutes);
        (previous, self.current_date)
    }

    /// Record that the party is now in `location`.
    pub fn relocate(&mut self, location: SystemLocation) {
        self.location = location;
    }
}
