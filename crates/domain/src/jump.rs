use serde::{Deserialize, Serialize};

use crate::value_objects::{FuelDraw, FuelPool, ImperialTimestamp, JumpDestination, SystemLocation};

// =============================================================================
// Jump Constants
// =============================================================================

/// Every jump takes one week in jump space, regardless of distance.
pub const JUMP_TRANSIT_HOURS: u32 = 168;

/// Fuel burned per parsec, as a fraction of hull tonnage.
pub const FUEL_FRACTION_PER_PARSEC: f64 = 0.1;

/// Tons of fuel a hull of `tonnage` needs to jump `distance_parsecs`.
pub fn fuel_required(tonnage: u32, distance_parsecs: u8) -> f64 {
    f64::from(tonnage) * FUEL_FRACTION_PER_PARSEC * f64::from(distance_parsecs)
}

// =============================================================================
// Jump Rules
// =============================================================================

/// Table rules that loosen jump validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpRules {
    /// Skip the fuel check (test mode). Fuel is still drained as far as it goes.
    pub skip_fuel_check: bool,
}

impl JumpRules {
    pub fn test_mode() -> Self {
        Self {
            skip_fuel_check: true,
        }
    }
}

// =============================================================================
// Jump State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpState {
    Normal,
    InTransit,
}

/// An active jump. Read-only while the ship is in jump space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpTransit {
    pub started_at: ImperialTimestamp,
    pub ends_at: ImperialTimestamp,
    pub destination: JumpDestination,
    pub distance_parsecs: u8,
    pub fuel_consumed: f64,
}

/// What is left behind once a jump completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalRecord {
    pub location: SystemLocation,
    pub arrived_at: ImperialTimestamp,
    pub departed_at: ImperialTimestamp,
    pub distance_parsecs: u8,
}

/// Result of entering jump space.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpStarted {
    pub started_at: ImperialTimestamp,
    pub ends_at: ImperialTimestamp,
    pub fuel_draw: FuelDraw,
    pub fuel_remaining: FuelPool,
}

// =============================================================================
// Rejections
// =============================================================================

/// Game-rule reasons a jump operation is refused.
///
/// These are expected outcomes shown to players, not faults.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum JumpRejection {
    #[error("Ship is already in jump space")]
    AlreadyInTransit,
    #[error("Jump drive is damaged")]
    DriveDamaged,
    #[error("Ship position has not been verified since arrival")]
    PositionUnverified,
    #[error("Jump distance must be at least one parsec")]
    InvalidDistance,
    #[error("Jump-{requested} exceeds the drive rating of {rating}")]
    RatingExceeded { requested: u8, rating: u8 },
    #[error("Insufficient fuel: need {required:.1} tons, have {available:.1} tons")]
    InsufficientFuel { required: f64, available: f64 },
    #[error("Ship is not in jump space")]
    NotInTransit,
}

/// Outcome of a pre-jump check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpCheck {
    pub allowed: bool,
    pub reason: Option<JumpRejection>,
    pub fuel_required: f64,
}

impl JumpCheck {
    pub(crate) fn allowed(fuel_required: f64) -> Self {
        Self {
            allowed: true,
            reason: None,
            fuel_required,
        }
    }

    pub(crate) fn rejected(reason: JumpRejection, fuel_required: f64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            fuel_required,
        }
    }

    /// Convert into a `Result`, keeping the rejection reason.
    pub fn into_result(self) -> Result<f64, JumpRejection> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(self.fuel_required),
        }
    }
}

/// Where a ship stands relative to jump space at a given campaign time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpStatus {
    pub in_transit: bool,
    /// Whole hours until the ship may leave jump space, never negative.
    pub hours_remaining: i64,
    pub can_exit: bool,
    pub transit: Option<JumpTransit>,
    pub last_arrival: Option<ArrivalRecord>,
}
