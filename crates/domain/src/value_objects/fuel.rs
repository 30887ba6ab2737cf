//! Ship fuel reservoirs.
//!
//! A ship carries three grades of fuel. Drawing fuel always takes refined
//! first, then processed, then unrefined, and never leaves a reservoir below
//! zero.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Tolerance for float comparisons on fuel tonnage.
const FUEL_EPSILON: f64 = 1e-9;

/// Fuel carried by a ship, in tons.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelPool {
    refined: f64,
    processed: f64,
    unrefined: f64,
}

/// How much of each grade a single draw removed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelDraw {
    pub refined: f64,
    pub processed: f64,
    pub unrefined: f64,
}

impl FuelDraw {
    pub fn total(&self) -> f64 {
        self.refined + self.processed + self.unrefined
    }
}

impl FuelPool {
    /// Create a pool, rejecting negative or non-finite quantities.
    pub fn new(refined: f64, processed: f64, unrefined: f64) -> Result<Self, DomainError> {
        for (grade, amount) in [
            ("refined", refined),
            ("processed", processed),
            ("unrefined", unrefined),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(DomainError::validation(format!(
                    "{} fuel must be a non-negative number, got {}",
                    grade, amount
                )));
            }
        }
        Ok(Self {
            refined,
            processed,
            unrefined,
        })
    }

    /// A pool holding only refined fuel.
    pub fn refined_only(tons: f64) -> Result<Self, DomainError> {
        Self::new(tons, 0.0, 0.0)
    }

    pub fn refined(&self) -> f64 {
        self.refined
    }

    pub fn processed(&self) -> f64 {
        self.processed
    }

    pub fn unrefined(&self) -> f64 {
        self.unrefined
    }

    pub fn total(&self) -> f64 {
        self.refined + self.processed + self.unrefined
    }

    pub fn can_supply(&self, tons: f64) -> bool {
        self.total() + FUEL_EPSILON >= tons
    }

    /// Remove `tons` in priority order.
    ///
    /// Nothing is drained when the pool cannot cover the full amount.
    pub fn consume(&mut self, tons: f64) -> Result<FuelDraw, DomainError> {
        if !tons.is_finite() || tons < 0.0 {
            return Err(DomainError::validation(format!(
                "fuel draw must be a non-negative number, got {}",
                tons
            )));
        }
        if !self.can_supply(tons) {
            return Err(DomainError::InsufficientFuel {
                required: tons,
                available: self.total(),
            });
        }
        Ok(self.drain(tons))
    }

    /// Remove up to `tons` in priority order, stopping when the pool is empty.
    pub fn consume_available(&mut self, tons: f64) -> FuelDraw {
        if !tons.is_finite() || tons <= 0.0 {
            return FuelDraw::default();
        }
        self.drain(tons.min(self.total()))
    }

    /// Convert up to `tons` of unrefined fuel into processed fuel.
    ///
    /// Returns the amount actually converted.
    pub fn process(&mut self, tons: f64) -> f64 {
        if !tons.is_finite() || tons <= 0.0 {
            return 0.0;
        }
        let converted = tons.min(self.unrefined);
        self.unrefined = clamp_zero(self.unrefined - converted);
        self.processed += converted;
        converted
    }

    fn drain(&mut self, tons: f64) -> FuelDraw {
        let mut remaining = tons;
        let mut draw = FuelDraw::default();

        let from_refined = remaining.min(self.refined);
        self.refined = clamp_zero(self.refined - from_refined);
        draw.refined = from_refined;
        remaining -= from_refined;

        let from_processed = remaining.min(self.processed);
        self.processed = clamp_zero(self.processed - from_processed);
        draw.processed = from_processed;
        remaining -= from_processed;

        let from_unrefined = remaining.min(self.unrefined);
        self.unrefined = clamp_zero(self.unrefined - from_unrefined);
        draw.unrefined = from_unrefined;

        draw
    }
}

fn clamp_zero(value: f64) -> f64 {
    if value < FUEL_EPSILON {
        0.0
    } else {
        value
    }
}
