//! Unified error types for the domain layer
//!
//! Provides a common error type for domain operations so the engine can map
//! failures without resorting to strings or `anyhow`.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A timestamp string did not match `YYYY-DDD` or `YYYY-DDD HH:MM`
    #[error("Malformed timestamp '{input}': {reason}")]
    MalformedTimestamp { input: String, reason: String },

    /// Not enough fuel across all reservoirs
    #[error("Insufficient fuel: required {required:.1} tons, available {available:.1} tons")]
    InsufficientFuel { required: f64, available: f64 },
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if tonnage == 0 {
    ///     return Err(DomainError::validation("Ship tonnage must be positive"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create a malformed timestamp error for the given input.
    pub fn malformed_timestamp(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
