//! Interval callbacks fed by the campaign clock.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use wayfarer_domain::CampaignId;

/// A subsystem that reacts to elapsed campaign time.
///
/// Handlers run one at a time, in registration order, while the campaign's
/// advance is held. A handler must not advance the same campaign's clock or
/// wait on its jump section.
#[async_trait]
pub trait IntervalHandler: Send + Sync {
    /// Called once per advance that crosses the registered interval.
    ///
    /// `elapsed_minutes` is a whole multiple of the interval.
    async fn on_elapsed(&self, campaign_id: CampaignId, elapsed_minutes: u32)
        -> anyhow::Result<()>;
}

/// Adapter that turns an async closure into an `IntervalHandler`.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> IntervalHandler for FnHandler<F>
where
    F: Fn(CampaignId, u32) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn on_elapsed(
        &self,
        campaign_id: CampaignId,
        elapsed_minutes: u32,
    ) -> anyhow::Result<()> {
        (self.f)(campaign_id, elapsed_minutes).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn IntervalHandler>
where
    F: Fn(CampaignId, u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// What happened to one callback during an advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    pub callback_id: String,
    pub status: CallbackStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CallbackStatus {
    /// Interval not reached yet; minutes carried forward
    Accumulating { accumulated_minutes: u32 },
    /// Handler ran and succeeded
    Fired { elapsed_minutes: u32 },
    /// Handler ran and returned an error or panicked
    Failed { elapsed_minutes: u32, error: String },
}

impl CallbackOutcome {
    pub fn fired(&self) -> bool {
        matches!(
            self.status,
            CallbackStatus::Fired { .. } | CallbackStatus::Failed { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, CallbackStatus::Failed { .. })
    }
}
