//! Jump travel controller.
//!
//! Drives a ship through `Normal -> InTransit -> Normal`. Mutating operations
//! hold the campaign's clock section so the date cannot move underneath them
//! and an interval callback cannot race the ship write.

use std::sync::Arc;

use wayfarer_domain::{
    ArrivalRecord, Campaign, CampaignId, FuelDraw, FuelPool, ImperialTimestamp, JumpCheck,
    JumpDestination, JumpRejection, JumpRules, JumpStatus, Ship, ShipId, SystemLocation,
};

use super::JumpError;
use crate::infrastructure::ports::{CampaignRepo, ShipRepo, StarMap};
use crate::use_cases::time::TimeCoordinator;

/// A ship that has just entered jump space.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitResult {
    pub ship_id: ShipId,
    pub destination: JumpDestination,
    pub started_at: ImperialTimestamp,
    pub ends_at: ImperialTimestamp,
    pub fuel_draw: FuelDraw,
    pub fuel_remaining: FuelPool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitiateOutcome {
    Started(TransitResult),
    Rejected(JumpRejection),
}

/// A ship that has left jump space.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalResult {
    pub ship_id: ShipId,
    pub campaign_id: CampaignId,
    pub arrival: ArrivalRecord,
    /// False when the crew dropped out before the full transit time
    pub on_schedule: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    Arrived(ArrivalResult),
    Rejected(JumpRejection),
}

/// A ship whose transit time has run out and can be brought out of jump.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTransit {
    pub ship_id: ShipId,
    pub ship_name: String,
    pub destination: JumpDestination,
    pub ends_at: ImperialTimestamp,
}

pub struct JumpTravel {
    ships: Arc<dyn ShipRepo>,
    campaigns: Arc<dyn CampaignRepo>,
    star_map: Arc<dyn StarMap>,
    coordinator: TimeCoordinator,
    rules: JumpRules,
}

impl JumpTravel {
    pub fn new(
        ships: Arc<dyn ShipRepo>,
        campaigns: Arc<dyn CampaignRepo>,
        star_map: Arc<dyn StarMap>,
        coordinator: TimeCoordinator,
        rules: JumpRules,
    ) -> Self {
        Self {
            ships,
            campaigns,
            star_map,
            coordinator,
            rules,
        }
    }

    /// Check whether `ship_id` may jump `distance_parsecs` right now.
    pub async fn can_initiate(
        &self,
        ship_id: ShipId,
        distance_parsecs: u8,
    ) -> Result<JumpCheck, JumpError> {
        let ship = self.load_ship(ship_id).await?;
        Ok(ship.check_jump(distance_parsecs, self.rules))
    }

    /// Put a ship into jump space bound for `destination`.
    ///
    /// Game-rule refusals come back as `InitiateOutcome::Rejected` and leave
    /// the ship untouched.
    pub async fn initiate(
        &self,
        ship_id: ShipId,
        destination: JumpDestination,
        distance_parsecs: u8,
    ) -> Result<InitiateOutcome, JumpError> {
        let campaign_id = self.load_ship(ship_id).await?.campaign_id();
        let _section = self.coordinator.exclusive(campaign_id).await?;

        // 1. Re-read under the section
        let mut ship = self.load_ship(ship_id).await?;
        let campaign = self.load_campaign(campaign_id).await?;

        // 2. Validate, drain fuel and write the transit
        let started = match ship.begin_jump(
            campaign.current_date(),
            destination.clone(),
            distance_parsecs,
            self.rules,
        ) {
            Ok(started) => started,
            Err(reason) => {
                tracing::info!(
                    ship_id = %ship_id,
                    distance_parsecs,
                    reason = %reason,
                    "Jump rejected"
                );
                return Ok(InitiateOutcome::Rejected(reason));
            }
        };

        // 3. Persist
        self.ships.save(&ship).await?;

        tracing::info!(
            ship_id = %ship_id,
            campaign_id = %campaign_id,
            destination = %destination.name,
            distance_parsecs,
            fuel_used = started.fuel_draw.total(),
            ends_at = %started.ends_at,
            "Ship entered jump space"
        );

        Ok(InitiateOutcome::Started(TransitResult {
            ship_id,
            destination,
            started_at: started.started_at,
            ends_at: started.ends_at,
            fuel_draw: started.fuel_draw,
            fuel_remaining: started.fuel_remaining,
        }))
    }

    /// Jump progress against the campaign's current date. Never mutates.
    pub async fn status(&self, ship_id: ShipId) -> Result<JumpStatus, JumpError> {
        let ship = self.load_ship(ship_id).await?;
        let campaign = self.load_campaign(ship.campaign_id()).await?;
        Ok(ship.jump_status(campaign.current_date()))
    }

    /// Bring a ship out of jump space at its destination.
    ///
    /// Completion is an explicit action; it does not wait for the transit
    /// time to run out.
    pub async fn complete(&self, ship_id: ShipId) -> Result<CompleteOutcome, JumpError> {
        let campaign_id = self.load_ship(ship_id).await?.campaign_id();
        let _section = self.coordinator.exclusive(campaign_id).await?;

        // 1. Re-read under the section
        let mut ship = self.load_ship(ship_id).await?;
        let Some(transit) = ship.jump().cloned() else {
            return Ok(CompleteOutcome::Rejected(JumpRejection::NotInTransit));
        };
        let mut campaign = self.load_campaign(campaign_id).await?;
        let now = campaign.current_date();
        let on_schedule = ship.jump_status(now).can_exit;

        // 2. Resolve where the ship actually came out
        let location = self.resolve_destination(&transit.destination).await?;

        // 3. Swap the transit for an arrival record and move the party
        let arrival = match ship.complete_jump(location.clone(), now) {
            Ok(arrival) => arrival,
            Err(reason) => return Ok(CompleteOutcome::Rejected(reason)),
        };
        campaign.relocate(location);

        // 4. Persist
        self.ships.save(&ship).await?;
        self.campaigns.save(&campaign).await?;

        tracing::info!(
            ship_id = %ship_id,
            campaign_id = %campaign_id,
            location = %arrival.location,
            on_schedule,
            "Ship left jump space"
        );

        Ok(CompleteOutcome::Arrived(ArrivalResult {
            ship_id,
            campaign_id,
            arrival,
            on_schedule,
        }))
    }

    /// Ships in the campaign whose transit has run out at `now`.
    ///
    /// Meant to run after every applied advance. Completes nothing.
    pub async fn check_due_transits(
        &self,
        campaign_id: CampaignId,
        now: ImperialTimestamp,
    ) -> Result<Vec<DueTransit>, JumpError> {
        let ships = self.ships.list_in_campaign(campaign_id).await?;
        let due: Vec<DueTransit> = ships
            .iter()
            .filter_map(|ship| {
                let transit = ship.jump()?;
                ship.jump_status(now).can_exit.then(|| DueTransit {
                    ship_id: ship.id(),
                    ship_name: ship.name().to_string(),
                    destination: transit.destination.clone(),
                    ends_at: transit.ends_at,
                })
            })
            .collect();

        if !due.is_empty() {
            tracing::debug!(
                campaign_id = %campaign_id,
                count = due.len(),
                "Ships ready to leave jump space"
            );
        }
        Ok(due)
    }

    /// Stored coordinates first, then a lookup on the cleaned name, then the
    /// cleaned name itself.
    async fn resolve_destination(
        &self,
        destination: &JumpDestination,
    ) -> Result<SystemLocation, JumpError> {
        if let Some((sector, hex)) = destination.coordinates() {
            if let Some(found) = self.star_map.find_by_coordinates(sector, hex).await? {
                return Ok(found);
            }
        }

        let clean = destination.clean_name();
        let mut matches = self.star_map.find_by_name(&clean).await?;
        if matches.len() > 1 {
            tracing::debug!(
                name = %clean,
                candidates = matches.len(),
                "Ambiguous destination name"
            );
            if let Some(sector) = destination.sector.as_deref() {
                matches.retain(|m| {
                    m.sector
                        .as_deref()
                        .is_some_and(|s| s.eq_ignore_ascii_case(sector))
                });
            }
        }
        if let Some(found) = matches.into_iter().next() {
            return Ok(found);
        }

        Ok(SystemLocation {
            name: clean,
            sector: destination.sector.clone(),
            hex: destination.hex.clone(),
        })
    }

    async fn load_ship(&self, ship_id: ShipId) -> Result<Ship, JumpError> {
        self.ships
            .get(ship_id)
            .await?
            .ok_or(JumpError::ShipNotFound(ship_id))
    }

    async fn load_campaign(&self, campaign_id: CampaignId) -> Result<Campaign, JumpError> {
        self.campaigns
            .get(campaign_id)
            .await?
            .ok_or(JumpError::CampaignNotFound(campaign_id))
    }
}
