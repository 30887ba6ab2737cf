//! Ship aggregate - A vessel and its jump state machine
//!
//! A ship is either in normal space or in jump space:
//!
//! ```text
//! Normal --begin_jump--> InTransit --complete_jump--> Normal (arrived)
//! ```
//!
//! Validation always happens before mutation, so a rejected jump leaves the
//! ship exactly as it was.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::jump::{
    fuel_required, ArrivalRecord, JumpCheck, JumpRejection, JumpRules, JumpStarted, JumpState,
    JumpStatus, JumpTransit, JUMP_TRANSIT_HOURS,
};
use crate::value_objects::{
    FuelPool, ImperialTimestamp, JumpDestination, LocalPosition, SystemLocation,
};
use crate::{CampaignId, ShipId};

/// A vessel belonging to a campaign.
///
/// # Invariants
///
/// - `tonnage` is positive
/// - a ship with an active `jump` never accepts another jump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ship {
    id: ShipId,
    campaign_id: CampaignId,
    name: String,
    tonnage: u32,
    jump_rating: u8,
    drive_damaged: bool,
    fuel: FuelPool,
    /// Tons of unrefined fuel the onboard processor handles per hour
    fuel_processor_rate: Option<f64>,
    jump: Option<JumpTransit>,
    last_arrival: Option<ArrivalRecord>,
    position_verified: bool,
    local_position: LocalPosition,
}

impl Ship {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(
        campaign_id: CampaignId,
        name: impl Into<String>,
        tonnage: u32,
        jump_rating: u8,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("Ship name cannot be empty"));
        }
        if tonnage == 0 {
            return Err(DomainError::validation("Ship tonnage must be positive"));
        }
        Ok(Self {
            id: ShipId::new(),
            campaign_id,
            name,
            tonnage,
            jump_rating,
            drive_damaged: false,
            fuel: FuelPool::default(),
            fuel_processor_rate: None,
            jump: None,
            last_arrival: None,
            position_verified: true,
            local_position: LocalPosition::default(),
        })
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_id(mut self, id: ShipId) -> Self {
        self.id = id;
        self
    }

    pub fn with_fuel(mut self, fuel: FuelPool) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn with_fuel_processor(mut self, tons_per_hour: f64) -> Self {
        self.fuel_processor_rate = (tons_per_hour.is_finite() && tons_per_hour > 0.0)
            .then_some(tons_per_hour);
        self
    }

    pub fn with_drive_damaged(mut self, damaged: bool) -> Self {
        self.drive_damaged = damaged;
        self
    }

    pub fn docked_at(mut self, facility: impl Into<String>) -> Self {
        self.local_position = LocalPosition::Docked(facility.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> ShipId {
        self.id
    }

    #[inline]
    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn tonnage(&self) -> u32 {
        self.tonnage
    }

    #[inline]
    pub fn jump_rating(&self) -> u8 {
        self.jump_rating
    }

    #[inline]
    pub fn is_drive_damaged(&self) -> bool {
        self.drive_damaged
    }

    #[inline]
    pub fn fuel(&self) -> &FuelPool {
        &self.fuel
    }

    #[inline]
    pub fn fuel_processor_rate(&self) -> Option<f64> {
        self.fuel_processor_rate
    }

    #[inline]
    pub fn jump(&self) -> Option<&JumpTransit> {
        self.jump.as_ref()
    }

    #[inline]
    pub fn last_arrival(&self) -> Option<&ArrivalRecord> {
        self.last_arrival.as_ref()
    }

    #[inline]
    pub fn is_position_verified(&self) -> bool {
        self.position_verified
    }

    #[inline]
    pub fn local_position(&self) -> &LocalPosition {
        &self.local_position
    }

    pub fn jump_state(&self) -> JumpState {
        if self.jump.is_some() {
            JumpState::InTransit
        } else {
            JumpState::Normal
        }
    }

    // =========================================================================
    // Jump State Machine
    // =========================================================================

    /// Check whether a jump of `distance_parsecs` is allowed right now.
    pub fn check_jump(&self, distance_parsecs: u8, rules: JumpRules) -> JumpCheck {
        let required = fuel_required(self.tonnage, distance_parsecs);

        if self.jump.is_some() {
            return JumpCheck::rejected(JumpRejection::AlreadyInTransit, required);
        }
        if self.drive_damaged {
            return JumpCheck::rejected(JumpRejection::DriveDamaged, required);
        }
        if !self.position_verified {
            return JumpCheck::rejected(JumpRejection::PositionUnverified, required);
        }
        if distance_parsecs == 0 {
            return JumpCheck::rejected(JumpRejection::InvalidDistance, required);
        }
        if distance_parsecs > self.jump_rating {
            return JumpCheck::rejected(
                JumpRejection::RatingExceeded {
                    requested: distance_parsecs,
                    rating: self.jump_rating,
                },
                required,
            );
        }
        if !rules.skip_fuel_check && !self.fuel.can_supply(required) {
            return JumpCheck::rejected(
                JumpRejection::InsufficientFuel {
                    required,
                    available: self.fuel.total(),
                },
                required,
            );
        }

        JumpCheck::allowed(required)
    }

    /// Enter jump space at `now`, bound for `destination`.
    pub fn begin_jump(
        &mut self,
        now: ImperialTimestamp,
        destination: JumpDestination,
        distance_parsecs: u8,
        rules: JumpRules,
    ) -> Result<JumpStarted, JumpRejection> {
        let required = self.check_jump(distance_parsecs, rules).into_result()?;

        let fuel_draw = if rules.skip_fuel_check {
            self.fuel.consume_available(required)
        } else {
            self.fuel
                .consume(required)
                .map_err(|_| JumpRejection::InsufficientFuel {
                    required,
                    available: self.fuel.total(),
                })?
        };

        let ends_at = now.advance(JUMP_TRANSIT_HOURS, 0);
        self.jump = Some(JumpTransit {
            started_at: now,
            ends_at,
            destination,
            distance_parsecs,
            fuel_consumed: fuel_draw.total(),
        });
        self.local_position = LocalPosition::InSpace;

        Ok(JumpStarted {
            started_at: now,
            ends_at,
            fuel_draw,
            fuel_remaining: self.fuel,
        })
    }

    /// Report jump progress at campaign time `now`. Never mutates.
    pub fn jump_status(&self, now: ImperialTimestamp) -> JumpStatus {
        match &self.jump {
            Some(transit) => {
                let hours_remaining = now.hours_until(&transit.ends_at).max(0);
                JumpStatus {
                    in_transit: true,
                    hours_remaining,
                    can_exit: hours_remaining <= 0,
                    transit: Some(transit.clone()),
                    last_arrival: self.last_arrival.clone(),
                }
            }
            None => JumpStatus {
                in_transit: false,
                hours_remaining: 0,
                can_exit: false,
                transit: None,
                last_arrival: self.last_arrival.clone(),
            },
        }
    }

    /// Leave jump space at `location`.
    ///
    /// The transit is replaced by an arrival record, the position must be
    /// re-verified and the ship sits at the arrival point.
    pub fn complete_jump(
        &mut self,
        location: SystemLocation,
        arrived_at: ImperialTimestamp,
    ) -> Result<ArrivalRecord, JumpRejection> {
        let transit = self.jump.take().ok_or(JumpRejection::NotInTransit)?;

        let arrival = ArrivalRecord {
            location,
            arrived_at,
            departed_at: transit.started_at,
            distance_parsecs: transit.distance_parsecs,
        };
        self.last_arrival = Some(arrival.clone());
        self.position_verified = false;
        self.local_position = LocalPosition::ArrivalPoint;

        Ok(arrival)
    }

    /// Confirm the ship's position after arrival, re-enabling navigation.
    ///
    /// Returns `true` if the flag changed.
    pub fn verify_position(&mut self) -> bool {
        let changed = !self.position_verified;
        self.position_verified = true;
        changed
    }

    // =========================================================================
    // Fuel Processing
    // =========================================================================

    /// Run the fuel processor for `elapsed_minutes`.
    ///
    /// Ships without a processor, or in jump space, process nothing.
    /// Returns tons converted.
    pub fn process_fuel(&mut self, elapsed_minutes: u32) -> f64 {
        let Some(rate) = self.fuel_processor_rate else {
            return 0.0;
        };
        if self.jump.is_some() {
            return 0.0;
        }
        let hours = f64::from(elapsed_minutes) / 60.0;
        self.fuel.process(rate * hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> ImperialTimestamp {
        s.parse().expect("valid timestamp")
    }

    fn scout() -> Ship {
        Ship::new(CampaignId::new(), "Far Trader", 100, 2)
            .expect("valid ship")
            .with_fuel(FuelPool::new(30.0, 10.0, 0.0).expect("valid fuel"))
            .docked_at("Regina Highport")
    }

    #[test]
    fn jump_one_draws_ten_tons_of_refined_first() {
        let mut ship = scout();
        let started = ship
            .begin_jump(at("1105-100 08:00"), JumpDestination::named("Efate"), 1, JumpRules::default())
            .expect("jump allowed");

        assert_eq!(started.fuel_draw.refined, 10.0);
        assert_eq!(started.fuel_draw.processed, 0.0);
        assert_eq!(started.fuel_remaining.total(), 30.0);
        assert_eq!(started.ends_at.to_string(), "1105-107 08:00");
        assert_eq!(ship.jump_state(), JumpState::InTransit);
        assert_eq!(ship.local_position(), &LocalPosition::InSpace);
    }

    #[test]
    fn second_jump_while_in_transit_is_rejected() {
        let mut ship = scout();
        ship.begin_jump(at("1105-100"), JumpDestination::named("Efate"), 1, JumpRules::default())
            .expect("first jump");
        let fuel_before = *ship.fuel();

        let err = ship
            .begin_jump(at("1105-101"), JumpDestination::named("Regina"), 1, JumpRules::default())
            .unwrap_err();

        assert_eq!(err, JumpRejection::AlreadyInTransit);
        assert_eq!(ship.fuel(), &fuel_before);
    }

    #[test]
    fn check_rejects_in_rule_order() {
        let ship = scout();
        assert_eq!(
            ship.check_jump(3, JumpRules::default()).reason,
            Some(JumpRejection::RatingExceeded { requested: 3, rating: 2 })
        );
        assert_eq!(
            ship.check_jump(0, JumpRules::default()).reason,
            Some(JumpRejection::InvalidDistance)
        );

        let damaged = scout().with_drive_damaged(true);
        assert_eq!(
            damaged.check_jump(3, JumpRules::default()).reason,
            Some(JumpRejection::DriveDamaged)
        );
    }

    #[test]
    fn insufficient_fuel_unless_test_mode() {
        let ship = Ship::new(CampaignId::new(), "Dry Tank", 100, 2)
            .expect("valid ship")
            .with_fuel(FuelPool::refined_only(5.0).expect("valid fuel"));

        let check = ship.check_jump(1, JumpRules::default());
        assert!(!check.allowed);
        assert_eq!(
            check.reason,
            Some(JumpRejection::InsufficientFuel { required: 10.0, available: 5.0 })
        );

        let mut ship = ship;
        let started = ship
            .begin_jump(at("1105-001"), JumpDestination::named("Efate"), 1, JumpRules::test_mode())
            .expect("test mode skips fuel check");
        assert_eq!(started.fuel_draw.total(), 5.0);
        assert_eq!(ship.fuel().total(), 0.0);
    }

    #[test]
    fn status_counts_down_without_mutating() {
        let mut ship = scout();
        ship.begin_jump(at("1105-100 08:00"), JumpDestination::named("Efate"), 1, JumpRules::default())
            .expect("jump");
        let before = ship.clone();

        let early = ship.jump_status(at("1105-103 08:00"));
        assert!(early.in_transit);
        assert_eq!(early.hours_remaining, 96);
        assert!(!early.can_exit);

        let late = ship.jump_status(at("1105-110 00:00"));
        assert_eq!(late.hours_remaining, 0);
        assert!(late.can_exit);
        assert_eq!(ship, before);
    }

    #[test]
    fn completing_replaces_transit_with_arrival() {
        let mut ship = scout();
        ship.begin_jump(at("1105-100"), JumpDestination::named("Efate"), 1, JumpRules::default())
            .expect("jump");

        let arrival = ship
            .complete_jump(SystemLocation::new("Efate"), at("1105-107"))
            .expect("in transit");

        assert_eq!(arrival.departed_at, at("1105-100"));
        assert!(ship.jump().is_none());
        assert_eq!(ship.last_arrival(), Some(&arrival));
        assert!(!ship.is_position_verified());
        assert_eq!(ship.local_position(), &LocalPosition::ArrivalPoint);
        assert_eq!(
            ship.check_jump(1, JumpRules::default()).reason,
            Some(JumpRejection::PositionUnverified)
        );

        assert!(ship.verify_position());
        assert!(ship.check_jump(1, JumpRules::default()).allowed);
    }

    #[test]
    fn completing_without_transit_fails() {
        let mut ship = scout();
        let err = ship
            .complete_jump(SystemLocation::new("Efate"), at("1105-107"))
            .unwrap_err();
        assert_eq!(err, JumpRejection::NotInTransit);
        assert!(ship.last_arrival().is_none());
    }

    #[test]
    fn processor_converts_unrefined_per_hour() {
        let mut ship = Ship::new(CampaignId::new(), "Gas Skimmer", 200, 1)
            .expect("valid ship")
            .with_fuel(FuelPool::new(0.0, 0.0, 20.0).expect("valid fuel"))
            .with_fuel_processor(4.0);

        assert_eq!(ship.process_fuel(90), 6.0);
        assert_eq!(ship.fuel().processed(), 6.0);
        assert_eq!(ship.fuel().unrefined(), 14.0);
    }
}
