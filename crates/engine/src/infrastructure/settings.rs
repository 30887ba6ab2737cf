//! Engine settings with environment variable overrides.
//!
//! Supported environment variables:
//! - WAYFARER_DEBOUNCE_MS: debounce window for clock advances (range: 0-5000)
//! - WAYFARER_ADVANCE_TIMEOUT_MS: how long a caller waits for a busy campaign (range: 100-60000)
//! - WAYFARER_CAMPAIGN_IDLE_TTL_SECS: idle time before a campaign's clock state is evicted (range: 60-604800)
//! - WAYFARER_EVICTION_SWEEP_SECS: how often the binary sweeps for idle campaigns (range: 10-86400)
//! - WAYFARER_JUMP_TEST_MODE: `true`/`1` skips the jump fuel check
//! - WAYFARER_SEED_FILE: JSON seed for the in-memory record store

use std::path::PathBuf;
use std::time::Duration;

use wayfarer_domain::JumpRules;

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);
pub const DEFAULT_ADVANCE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
pub const DEFAULT_EVICTION_SWEEP: Duration = Duration::from_secs(10 * 60);

/// Timing for the per-campaign clock coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    /// Advances arriving this soon after a started advance may be coalesced
    pub debounce_window: Duration,
    /// Bounded wait for a busy campaign before failing with a timeout
    pub advance_timeout: Duration,
    /// Campaign clock state untouched for this long may be evicted
    pub idle_ttl: Duration,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            advance_timeout: DEFAULT_ADVANCE_TIMEOUT,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineSettings {
    pub clock: ClockSettings,
    pub jump_rules: JumpRules,
    pub eviction_sweep: Option<Duration>,
    pub seed_file: Option<PathBuf>,
}

impl EngineSettings {
    /// Defaults with `WAYFARER_*` overrides applied.
    pub fn from_env() -> Self {
        let mut settings = Self {
            eviction_sweep: Some(DEFAULT_EVICTION_SWEEP),
            ..Self::default()
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Apply overrides from `lookup`, ignoring out-of-range or unparsable values.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = ranged_u64(&lookup, "WAYFARER_DEBOUNCE_MS", 0, 5_000) {
            self.clock.debounce_window = Duration::from_millis(ms);
        }
        if let Some(ms) = ranged_u64(&lookup, "WAYFARER_ADVANCE_TIMEOUT_MS", 100, 60_000) {
            self.clock.advance_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = ranged_u64(&lookup, "WAYFARER_CAMPAIGN_IDLE_TTL_SECS", 60, 604_800) {
            self.clock.idle_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = ranged_u64(&lookup, "WAYFARER_EVICTION_SWEEP_SECS", 10, 86_400) {
            self.eviction_sweep = Some(Duration::from_secs(secs));
        }

        if let Some(val) = lookup("WAYFARER_JUMP_TEST_MODE") {
            match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => {
                    self.jump_rules = JumpRules::test_mode();
                    tracing::warn!("WAYFARER_JUMP_TEST_MODE enabled, jump fuel checks are skipped");
                }
                "0" | "false" | "no" | "off" | "" => {}
                _ => tracing::warn!(
                    val = %val,
                    "WAYFARER_JUMP_TEST_MODE is not a boolean, ignoring"
                ),
            }
        }

        if let Some(path) = lookup("WAYFARER_SEED_FILE").filter(|p| !p.trim().is_empty()) {
            self.seed_file = Some(PathBuf::from(path.trim()));
        }
    }
}

fn ranged_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    let val = lookup(key)?;
    match val.trim().parse::<u64>() {
        Ok(n) if (min..=max).contains(&n) => {
            tracing::info!(key, value = n, "Applied environment override");
            Some(n)
        }
        Ok(n) => {
            tracing::warn!(key, value = n, min, max, "Environment override out of range, ignoring");
            None
        }
        Err(_) => {
            tracing::warn!(key, val = %val, "Environment override is not a valid integer, ignoring");
            None
        }
    }
}
