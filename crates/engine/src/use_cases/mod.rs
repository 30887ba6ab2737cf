//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate across ports and the campaign clock to fulfill
//! user stories.

pub mod fuel;
pub mod jump;
pub mod time;

// Re-export main types
pub use fuel::FuelProcessing;
pub use jump::JumpUseCases;
pub use time::{TimeCoordinator, TimeUseCases};
