//! Aggregates - Consistency boundaries with private state
//!
//! - `Campaign` owns the shared calendar and the party's location
//! - `Ship` owns fuel and the jump state machine

pub mod campaign;
pub mod ship;

pub use campaign::Campaign;
pub use ship::Ship;
