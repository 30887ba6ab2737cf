//! Jump travel use cases.

mod travel;
mod verify_position;

pub use travel::{
    ArrivalResult, CompleteOutcome, DueTransit, InitiateOutcome, JumpTravel, TransitResult,
};
pub use verify_position::VerifyPosition;

use std::sync::Arc;

use wayfarer_domain::{CampaignId, ShipId};

use crate::infrastructure::ports::RepoError;
use crate::use_cases::time::CoordinatorError;

/// Container for jump use cases.
pub struct JumpUseCases {
    pub travel: Arc<JumpTravel>,
    pub verify_position: Arc<VerifyPosition>,
}

impl JumpUseCases {
    pub fn new(travel: Arc<JumpTravel>, verify_position: Arc<VerifyPosition>) -> Self {
        Self {
            travel,
            verify_position,
        }
    }
}

/// Infrastructure failures of jump operations.
///
/// Game-rule refusals are not errors; they come back as `Rejected` outcomes.
#[derive(Debug, thiserror::Error)]
pub enum JumpError {
    #[error("Ship not found: {0}")]
    ShipNotFound(ShipId),
    #[error("Campaign not found: {0}")]
    CampaignNotFound(CampaignId),
    #[error("Campaign clock unavailable: {0}")]
    Clock(#[from] CoordinatorError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
