//! Wayfarer domain: the Imperial calendar, campaigns, ships, fuel and jump rules.
//!
//! Everything here is synchronous and side-effect free. Persistence, locking
//! and time fan-out live in `wayfarer-engine`.

pub mod aggregates;
pub mod error;
pub mod ids;
pub mod jump;
pub mod value_objects;

pub use aggregates::{Campaign, Ship};
pub use error::DomainError;
pub use ids::{CampaignId, ShipId};

pub use jump::{
    fuel_required, ArrivalRecord, JumpCheck, JumpRejection, JumpRules, JumpStarted, JumpState,
    JumpStatus, JumpTransit, FUEL_FRACTION_PER_PARSEC, JUMP_TRANSIT_HOURS,
};

pub use value_objects::calendar;
pub use value_objects::{
    clean_system_name, FuelDraw, FuelPool, ImperialTimestamp, JumpDestination, LocalPosition,
    SystemLocation, DAYS_PER_YEAR,
};
