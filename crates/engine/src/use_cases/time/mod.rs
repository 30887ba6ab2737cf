//! Time use cases.
//!
//! Handles campaign time operations including:
//! - Advancing the shared calendar through the per-campaign coordinator
//! - Fanning elapsed time out to interval callbacks
//! - Reporting ships whose jump transit ran out after an advance

mod callbacks;
mod coordinator;

pub use callbacks::{handler_fn, CallbackOutcome, CallbackStatus, FnHandler, IntervalHandler};
pub use coordinator::{
    AdvanceOptions, AdvanceOutcome, AdvanceReport, CallbackHandle, CallbackInfo, CampaignSection,
    ClockSnapshot, CoordinatorError, TimeCoordinator,
};

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use wayfarer_domain::{CampaignId, ImperialTimestamp};

use crate::use_cases::jump::{DueTransit, JumpTravel};

/// Container for time use cases.
pub struct TimeUseCases {
    pub advance: Arc<AdvanceTime>,
}

impl TimeUseCases {
    pub fn new(advance: Arc<AdvanceTime>) -> Self {
        Self { advance }
    }
}

// =============================================================================
// Advance Time
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceTimeResult {
    pub outcome: AdvanceOutcome,
    /// Ships able to leave jump space at the new date. Empty when debounced.
    pub due_transits: Vec<DueTransit>,
}

/// Ships found due after an advance the debounce flush applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTransitNotice {
    pub campaign_id: CampaignId,
    pub version: u64,
    pub new_date: ImperialTimestamp,
    pub due_transits: Vec<DueTransit>,
}

const NOTICE_CHANNEL_CAPACITY: usize = 64;

/// Use case for advancing a campaign's clock.
///
/// Advances through the coordinator, then looks for ships whose transit just
/// ran out so the table can be told. Nothing is completed automatically.
///
/// Debounced callers get no report of their own. Their minutes reach the
/// calendar through the flush, and `watch_flushes` checks those advances and
/// publishes what it finds to `subscribe_due_transits`.
pub struct AdvanceTime {
    coordinator: TimeCoordinator,
    travel: Arc<JumpTravel>,
    notices: broadcast::Sender<DueTransitNotice>,
}

impl AdvanceTime {
    pub fn new(coordinator: TimeCoordinator, travel: Arc<JumpTravel>) -> Self {
        Self {
            coordinator,
            travel,
            notices: broadcast::channel(NOTICE_CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe_due_transits(&self) -> broadcast::Receiver<DueTransitNotice> {
        self.notices.subscribe()
    }

    /// Run the due transit check for every advance the debounce flush applies.
    ///
    /// Runs until aborted.
    pub fn watch_flushes(&self) -> JoinHandle<()> {
        let mut applied = self.coordinator.subscribe();
        let travel = Arc::clone(&self.travel);
        let notices = self.notices.clone();

        tokio::spawn(async move {
            loop {
                let report = match applied.recv().await {
                    Ok(report) => report,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Flush watcher fell behind applied advances");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if !report.flushed {
                    continue;
                }

                let due_transits = match travel
                    .check_due_transits(report.campaign_id, report.new_date)
                    .await
                {
                    Ok(due) => due,
                    Err(e) => {
                        tracing::warn!(
                            campaign_id = %report.campaign_id,
                            error = %e,
                            "Failed to check due transits after flush"
                        );
                        continue;
                    }
                };
                if due_transits.is_empty() {
                    continue;
                }

                tracing::info!(
                    campaign_id = %report.campaign_id,
                    version = report.version,
                    count = due_transits.len(),
                    "Ships due after flushed advance"
                );
                // No subscribers is fine
                let _ = notices.send(DueTransitNotice {
                    campaign_id: report.campaign_id,
                    version: report.version,
                    new_date: report.new_date,
                    due_transits,
                });
            }
        })
    }

    pub async fn execute(
        &self,
        campaign_id: CampaignId,
        minutes: u32,
        options: AdvanceOptions,
    ) -> Result<AdvanceTimeResult, CoordinatorError> {
        let outcome = self.coordinator.advance(campaign_id, minutes, options).await?;

        let due_transits = match &outcome {
            AdvanceOutcome::Applied(report) => {
                match self
                    .travel
                    .check_due_transits(campaign_id, report.new_date)
                    .await
                {
                    Ok(due) => due,
                    Err(e) => {
                        // The advance itself is committed; report it regardless
                        tracing::warn!(
                            campaign_id = %campaign_id,
                            error = %e,
                            "Failed to check due transits after advance"
                        );
                        Vec::new()
                    }
                }
            }
            AdvanceOutcome::Debounced { .. } => Vec::new(),
        };

        Ok(AdvanceTimeResult {
            outcome,
            due_transits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::in_memory::{InMemoryCampaignRepo, InMemoryShipRepo, InMemoryStarMap};
    use crate::infrastructure::ports::{MockShipRepo, RepoError, ShipRepo};
    use crate::infrastructure::settings::ClockSettings;
    use std::time::Duration;
    use wayfarer_domain::{
        Campaign, FuelPool, JumpDestination, JumpRules, Ship, SystemLocation,
    };

    fn campaign() -> Campaign {
        Campaign::new(
            "Spinward Run",
            "1105-001 08:00".parse().expect("valid date"),
            SystemLocation::new("Regina"),
        )
        .expect("valid campaign")
    }

    fn quiet() -> ClockSettings {
        ClockSettings {
            debounce_window: Duration::ZERO,
            ..ClockSettings::default()
        }
    }

    fn build(
        campaigns: Arc<InMemoryCampaignRepo>,
        ships: Arc<dyn ShipRepo>,
    ) -> (AdvanceTime, Arc<JumpTravel>) {
        build_with(campaigns, ships, quiet())
    }

    fn build_with(
        campaigns: Arc<InMemoryCampaignRepo>,
        ships: Arc<dyn ShipRepo>,
        settings: ClockSettings,
    ) -> (AdvanceTime, Arc<JumpTravel>) {
        let coordinator =
            TimeCoordinator::new(campaigns.clone(), Arc::new(SystemClock::new()), settings);
        let travel = Arc::new(JumpTravel::new(
            ships,
            campaigns,
            Arc::new(InMemoryStarMap::new(Vec::new())),
            coordinator.clone(),
            JumpRules::default(),
        ));
        (AdvanceTime::new(coordinator, travel.clone()), travel)
    }

    #[tokio::test]
    async fn reports_ships_due_after_the_advance() {
        let c = campaign();
        let campaign_id = c.id();
        let ship = Ship::new(campaign_id, "Annic Nova", 100, 2)
            .expect("valid ship")
            .with_fuel(FuelPool::refined_only(40.0).expect("valid fuel"));
        let ship_id = ship.id();
        let (advance, travel) = build(
            Arc::new(InMemoryCampaignRepo::with_campaigns([c])),
            Arc::new(InMemoryShipRepo::with_ships([ship])),
        );

        travel
            .initiate(ship_id, JumpDestination::named("Efate"), 1)
            .await
            .expect("initiate");

        let early = advance
            .execute(campaign_id, 100 * 60, AdvanceOptions::default())
            .await
            .expect("advance");
        assert!(early.due_transits.is_empty());

        let due = advance
            .execute(campaign_id, 68 * 60, AdvanceOptions::default())
            .await
            .expect("advance");
        assert_eq!(due.outcome.version(), 2);
        assert_eq!(due.due_transits.len(), 1);
        assert_eq!(due.due_transits[0].ship_id, ship_id);
        assert_eq!(due.due_transits[0].ship_name, "Annic Nova");
    }

    #[tokio::test]
    async fn debounced_minutes_report_due_ships_once_flushed() {
        let c = campaign();
        let campaign_id = c.id();
        let ship = Ship::new(campaign_id, "Annic Nova", 100, 2)
            .expect("valid ship")
            .with_fuel(FuelPool::refined_only(40.0).expect("valid fuel"));
        let ship_id = ship.id();
        let (advance, travel) = build_with(
            Arc::new(InMemoryCampaignRepo::with_campaigns([c])),
            Arc::new(InMemoryShipRepo::with_ships([ship])),
            ClockSettings {
                debounce_window: Duration::from_millis(100),
                ..ClockSettings::default()
            },
        );
        let advance = Arc::new(advance);
        travel
            .initiate(ship_id, JumpDestination::named("Efate"), 1)
            .await
            .expect("initiate");

        // Keeps the first advance busy long enough for the second to fold
        let _slow = advance
            .coordinator
            .register_callback(
                campaign_id,
                "slow",
                1,
                handler_fn(|_, _| async {
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    Ok(())
                }),
            )
            .expect("register");
        let mut notices = advance.subscribe_due_transits();
        let watcher = advance.watch_flushes();

        let first = {
            let advance = Arc::clone(&advance);
            tokio::spawn(async move {
                advance
                    .execute(campaign_id, 60, AdvanceOptions::default())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = advance
            .execute(campaign_id, 200 * 60, AdvanceOptions::default())
            .await
            .expect("advance");
        assert!(matches!(second.outcome, AdvanceOutcome::Debounced { .. }));
        assert!(second.due_transits.is_empty());
        let first = first.await.expect("join").expect("advance");
        assert!(first.due_transits.is_empty());

        let notice = tokio::time::timeout(Duration::from_secs(1), notices.recv())
            .await
            .expect("notice in time")
            .expect("notice");
        assert_eq!(notice.campaign_id, campaign_id);
        assert_eq!(notice.version, 2);
        assert_eq!(notice.due_transits.len(), 1);
        assert_eq!(notice.due_transits[0].ship_id, ship_id);
        watcher.abort();
    }

    #[tokio::test]
    async fn transit_check_failure_does_not_hide_the_advance() {
        let c = campaign();
        let campaign_id = c.id();
        let mut ships = MockShipRepo::new();
        ships
            .expect_list_in_campaign()
            .returning(|_| Err(RepoError::storage("list_ships", "timeout")));
        let (advance, _travel) = build(
            Arc::new(InMemoryCampaignRepo::with_campaigns([c])),
            Arc::new(ships),
        );

        let result = advance
            .execute(campaign_id, 30, AdvanceOptions::default())
            .await
            .expect("advance");
        assert!(matches!(result.outcome, AdvanceOutcome::Applied(_)));
        assert!(result.due_transits.is_empty());
    }

    #[tokio::test]
    async fn coordinator_errors_pass_through() {
        let c = campaign();
        let campaign_id = c.id();
        let (advance, _travel) = build(
            Arc::new(InMemoryCampaignRepo::with_campaigns([c])),
            Arc::new(InMemoryShipRepo::new()),
        );
        advance.coordinator.set_lock(campaign_id, true);

        let err = advance
            .execute(campaign_id, 30, AdvanceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::TimeLocked));
    }
}
