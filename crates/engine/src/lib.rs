//! Wayfarer Engine library.
//!
//! Session clock and jump travel core for a multiplayer tabletop campaign.
//!
//! ## Structure
//!
//! - `use_cases/` - Clock advances, interval callbacks, jump travel, fuel processing
//! - `infrastructure/` - Port traits, in-memory adapters, clocks and settings
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
