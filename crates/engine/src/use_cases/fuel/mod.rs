//! Fuel processing use case.
//!
//! Ships with a fuel processor turn unrefined fuel into processed fuel as
//! campaign time passes. Runs as an hourly interval callback.

use std::sync::Arc;

use async_trait::async_trait;
use wayfarer_domain::CampaignId;

use crate::infrastructure::ports::{RepoError, ShipRepo};
use crate::use_cases::time::{CallbackHandle, CoordinatorError, IntervalHandler, TimeCoordinator};

pub const FUEL_PROCESSING_CALLBACK: &str = "fuel-processing";
pub const FUEL_PROCESSING_INTERVAL_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FuelProcessingReport {
    pub ships_processed: usize,
    pub tons_converted: f64,
}

pub struct FuelProcessing {
    ships: Arc<dyn ShipRepo>,
}

impl FuelProcessing {
    pub fn new(ships: Arc<dyn ShipRepo>) -> Self {
        Self { ships }
    }

    /// Run every processor in the campaign for `elapsed_minutes`.
    pub async fn execute(
        &self,
        campaign_id: CampaignId,
        elapsed_minutes: u32,
    ) -> Result<FuelProcessingReport, RepoError> {
        let mut report = FuelProcessingReport::default();

        for mut ship in self.ships.list_in_campaign(campaign_id).await? {
            let converted = ship.process_fuel(elapsed_minutes);
            if converted <= 0.0 {
                continue;
            }
            self.ships.save(&ship).await?;
            report.ships_processed += 1;
            report.tons_converted += converted;
        }

        if report.ships_processed > 0 {
            tracing::debug!(
                campaign_id = %campaign_id,
                elapsed_minutes,
                ships = report.ships_processed,
                tons = report.tons_converted,
                "Processed fuel"
            );
        }
        Ok(report)
    }

    /// Register as the campaign's hourly fuel callback.
    pub fn register(
        processing: &Arc<Self>,
        coordinator: &TimeCoordinator,
        campaign_id: CampaignId,
    ) -> Result<CallbackHandle, CoordinatorError> {
        let handler: Arc<dyn IntervalHandler> = processing.clone();
        coordinator.register_callback(
            campaign_id,
            FUEL_PROCESSING_CALLBACK,
            FUEL_PROCESSING_INTERVAL_MINUTES,
            handler,
        )
    }
}

#[async_trait]
impl IntervalHandler for FuelProcessing {
    async fn on_elapsed(&self, campaign_id: CampaignId, elapsed_minutes: u32) -> anyhow::Result<()> {
        self.execute(campaign_id, elapsed_minutes).await?;
        Ok(())
    }
}
