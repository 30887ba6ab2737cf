//! Repository port traits for the campaign record store.

use async_trait::async_trait;
use wayfarer_domain::{Campaign, CampaignId, Ship, ShipId, SystemLocation};

use super::error::RepoError;

// =============================================================================
// Record Store Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepo: Send + Sync {
    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, RepoError>;
    async fn save(&self, campaign: &Campaign) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipRepo: Send + Sync {
    async fn get(&self, id: ShipId) -> Result<Option<Ship>, RepoError>;
    async fn save(&self, ship: &Ship) -> Result<(), RepoError>;
    async fn list_in_campaign(&self, campaign_id: CampaignId) -> Result<Vec<Ship>, RepoError>;
}

// =============================================================================
// Star Map
// =============================================================================

/// Lookup of known star systems.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StarMap: Send + Sync {
    async fn find_by_coordinates(
        &self,
        sector: &str,
        hex: &str,
    ) -> Result<Option<SystemLocation>, RepoError>;

    /// All systems whose name matches, ignoring case.
    async fn find_by_name(&self, name: &str) -> Result<Vec<SystemLocation>, RepoError>;
}
