//! Position verification after arrival.

use std::sync::Arc;

use wayfarer_domain::ShipId;

use super::JumpError;
use crate::infrastructure::ports::ShipRepo;
use crate::use_cases::time::TimeCoordinator;

/// Confirms a ship's position so it may navigate again.
pub struct VerifyPosition {
    ships: Arc<dyn ShipRepo>,
    coordinator: TimeCoordinator,
}

impl VerifyPosition {
    pub fn new(ships: Arc<dyn ShipRepo>, coordinator: TimeCoordinator) -> Self {
        Self { ships, coordinator }
    }

    /// Returns `true` if the ship was unverified before the call.
    pub async fn execute(&self, ship_id: ShipId) -> Result<bool, JumpError> {
        let campaign_id = self
            .ships
            .get(ship_id)
            .await?
            .ok_or(JumpError::ShipNotFound(ship_id))?
            .campaign_id();
        let _section = self.coordinator.exclusive(campaign_id).await?;

        let mut ship = self
            .ships
            .get(ship_id)
            .await?
            .ok_or(JumpError::ShipNotFound(ship_id))?;
        if !ship.verify_position() {
            return Ok(false);
        }
        self.ships.save(&ship).await?;

        tracing::info!(ship_id = %ship_id, "Ship position verified");
        Ok(true)
    }
}
