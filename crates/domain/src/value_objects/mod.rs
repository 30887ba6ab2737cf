//! Value objects - Immutable objects defined by their attributes

pub mod calendar;
mod fuel;
mod location;

pub use calendar::{ImperialTimestamp, DAYS_PER_YEAR};
pub use fuel::{FuelDraw, FuelPool};
pub use location::{clean_system_name, JumpDestination, LocalPosition, SystemLocation};
