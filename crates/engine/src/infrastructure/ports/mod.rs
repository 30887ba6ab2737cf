//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - The campaign record store (campaigns, ships)
//! - Star system lookup
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CampaignRepo, ShipRepo, StarMap};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockCampaignRepo, MockShipRepo, MockStarMap};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::RepoError;
