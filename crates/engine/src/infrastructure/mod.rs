//! Infrastructure implementations.
//!
//! Contains port trait definitions and the adapters the binary wires in.

pub mod clock;
pub mod in_memory;
pub mod ports;
pub mod settings;
