//! In-memory record store adapters.
//!
//! Used by the binary when no external store is wired in, and by tests that
//! want real persistence semantics without mocks.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use wayfarer_domain::{
    clean_system_name, Campaign, CampaignId, Ship, ShipId, SystemLocation,
};

use crate::infrastructure::ports::{CampaignRepo, RepoError, ShipRepo, StarMap};

pub struct InMemoryCampaignRepo {
    by_id: RwLock<HashMap<CampaignId, Campaign>>,
}

impl InMemoryCampaignRepo {
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_campaigns(campaigns: impl IntoIterator<Item = Campaign>) -> Self {
        Self {
            by_id: RwLock::new(campaigns.into_iter().map(|c| (c.id(), c)).collect()),
        }
    }
}

impl Default for InMemoryCampaignRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CampaignRepo for InMemoryCampaignRepo {
    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, RepoError> {
        Ok(self.by_id.read().await.get(&id).cloned())
    }

    async fn save(&self, campaign: &Campaign) -> Result<(), RepoError> {
        self.by_id
            .write()
            .await
            .insert(campaign.id(), campaign.clone());
        Ok(())
    }
}

pub struct InMemoryShipRepo {
    by_id: RwLock<HashMap<ShipId, Ship>>,
}

impl InMemoryShipRepo {
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_ships(ships: impl IntoIterator<Item = Ship>) -> Self {
        Self {
            by_id: RwLock::new(ships.into_iter().map(|s| (s.id(), s)).collect()),
        }
    }
}

impl Default for InMemoryShipRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShipRepo for InMemoryShipRepo {
    async fn get(&self, id: ShipId) -> Result<Option<Ship>, RepoError> {
        Ok(self.by_id.read().await.get(&id).cloned())
    }

    async fn save(&self, ship: &Ship) -> Result<(), RepoError> {
        self.by_id.write().await.insert(ship.id(), ship.clone());
        Ok(())
    }

    async fn list_in_campaign(&self, campaign_id: CampaignId) -> Result<Vec<Ship>, RepoError> {
        let mut ships: Vec<Ship> = self
            .by_id
            .read()
            .await
            .values()
            .filter(|s| s.campaign_id() == campaign_id)
            .cloned()
            .collect();
        ships.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(ships)
    }
}

pub struct InMemoryStarMap {
    systems: Vec<SystemLocation>,
}

impl InMemoryStarMap {
    pub fn new(systems: Vec<SystemLocation>) -> Self {
        Self { systems }
    }
}

#[async_trait]
impl StarMap for InMemoryStarMap {
    async fn find_by_coordinates(
        &self,
        sector: &str,
        hex: &str,
    ) -> Result<Option<SystemLocation>, RepoError> {
        Ok(self
            .systems
            .iter()
            .find(|s| {
                s.sector.as_deref().is_some_and(|x| x.eq_ignore_ascii_case(sector))
                    && s.hex.as_deref() == Some(hex)
            })
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<SystemLocation>, RepoError> {
        let wanted = clean_system_name(name);
        Ok(self
            .systems
            .iter()
            .filter(|s| s.name.eq_ignore_ascii_case(&wanted))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Seed File
// =============================================================================

/// Initial records for an in-memory deployment.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub ships: Vec<Ship>,
    #[serde(default)]
    pub systems: Vec<SystemLocation>,
}

impl SeedData {
    /// Read seed records from a JSON file.
    pub async fn load(path: &Path) -> Result<Self, RepoError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RepoError::storage("load_seed", e))?;
        serde_json::from_str(&raw).map_err(RepoError::serialization)
    }

    pub fn into_stores(self) -> (InMemoryCampaignRepo, InMemoryShipRepo, InMemoryStarMap) {
        (
            InMemoryCampaignRepo::with_campaigns(self.campaigns),
            InMemoryShipRepo::with_ships(self.ships),
            InMemoryStarMap::new(self.systems),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_only_ships_of_the_campaign() {
        let campaign_id = CampaignId::new();
        let repo = InMemoryShipRepo::with_ships([
            Ship::new(campaign_id, "Beowulf", 200, 1).expect("valid ship"),
            Ship::new(campaign_id, "Annic Nova", 100, 2).expect("valid ship"),
            Ship::new(CampaignId::new(), "Stranger", 100, 2).expect("valid ship"),
        ]);

        let ships = repo.list_in_campaign(campaign_id).await.expect("list");
        let names: Vec<&str> = ships.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Annic Nova", "Beowulf"]);
    }

    #[tokio::test]
    async fn star_map_matches_cleaned_names_and_coordinates() {
        let map = InMemoryStarMap::new(vec![
            SystemLocation::at("Regina", "Spinward Marches", "1910"),
            SystemLocation::at("Efate", "Spinward Marches", "1705"),
        ]);

        let by_name = map.find_by_name("regina (Spinward Marches)").await.expect("lookup");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].hex.as_deref(), Some("1910"));

        let by_coords = map
            .find_by_coordinates("spinward marches", "1705")
            .await
            .expect("lookup");
        assert_eq!(by_coords.map(|s| s.name), Some("Efate".to_string()));
    }

    #[test]
    fn seed_data_parses_persisted_shapes() {
        let raw = r#"{
            "campaigns": [{
                "id": "6f1c4f8e-0d5e-4a8b-9b57-3f3f0a1d2c11",
                "name": "Spinward Run",
                "currentDate": "1105-042 08:00",
                "location": { "name": "Regina", "sector": "Spinward Marches", "hex": "1910" }
            }],
            "systems": [{ "name": "Efate", "sector": "Spinward Marches", "hex": "1705" }]
        }"#;

        let seed: SeedData = serde_json::from_str(raw).expect("seed parses");
        assert_eq!(seed.campaigns.len(), 1);
        assert_eq!(seed.campaigns[0].current_date().to_string(), "1105-042 08:00");
        assert!(seed.ships.is_empty());
        assert_eq!(seed.systems.len(), 1);
    }
}
