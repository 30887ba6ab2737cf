//! Per-campaign clock coordination.
//!
//! Every campaign gets a lazily created `CampaignClock` holding its version
//! counter, lock flag, registered callbacks and debounce state. Advances for
//! one campaign are applied one at a time behind a FIFO gate; different
//! campaigns never block each other.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use wayfarer_domain::{CampaignId, ImperialTimestamp};

use super::callbacks::{CallbackOutcome, CallbackStatus, IntervalHandler};
use crate::infrastructure::ports::{CampaignRepo, ClockPort, RepoError};
use crate::infrastructure::settings::ClockSettings;

// =============================================================================
// Errors and Outcomes
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Version mismatch: expected {expected}, current is {actual}")]
    VersionMismatch { expected: u64, actual: u64 },
    #[error("Time is locked for this campaign")]
    TimeLocked,
    #[error("Timed out after {waited:?} waiting for the campaign clock")]
    Timeout { waited: Duration },
    #[error("Callback interval must be at least one minute")]
    InvalidInterval,
    #[error("Advance must be at least one minute")]
    ZeroAdvance,
    #[error("Campaign not found: {0}")]
    CampaignNotFound(CampaignId),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Per-call advance options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceOptions {
    /// Bypass the campaign lock
    pub force: bool,
    /// Fail unless the campaign is still at this version
    pub expected_version: Option<u64>,
}

impl AdvanceOptions {
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn expecting(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// An advance that changed the campaign date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceReport {
    pub campaign_id: CampaignId,
    pub version: u64,
    /// Requested minutes plus any debounced minutes folded in
    pub minutes_applied: u32,
    pub previous_date: ImperialTimestamp,
    pub new_date: ImperialTimestamp,
    /// One entry per registered callback, in registration order
    pub callbacks: Vec<CallbackOutcome>,
    /// Applied by the debounce flush rather than by a caller
    pub flushed: bool,
}

impl AdvanceReport {
    pub fn failures(&self) -> impl Iterator<Item = &CallbackOutcome> {
        self.callbacks.iter().filter(|c| c.is_failure())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Applied(AdvanceReport),
    /// Folded into a pending advance that a flush timer will apply
    Debounced { pending_minutes: u32, version: u64 },
}

impl AdvanceOutcome {
    pub fn version(&self) -> u64 {
        match self {
            Self::Applied(report) => report.version,
            Self::Debounced { version, .. } => *version,
        }
    }

    pub fn into_applied(self) -> Option<AdvanceReport> {
        match self {
            Self::Applied(report) => Some(report),
            Self::Debounced { .. } => None,
        }
    }
}

/// Read-only view of a campaign clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockSnapshot {
    pub version: u64,
    pub locked: bool,
    pub busy: bool,
    pub pending_minutes: u32,
    pub callbacks: Vec<CallbackInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackInfo {
    pub id: String,
    pub interval_minutes: u32,
    pub accumulated_minutes: u32,
}

// =============================================================================
// Campaign Clock State
// =============================================================================

struct Registration {
    token: u64,
    id: String,
    interval_minutes: u32,
    accumulated_minutes: u32,
    handler: Arc<dyn IntervalHandler>,
}

impl Registration {
    /// Add `minutes` and return the whole-interval amount to fire, if any.
    ///
    /// The remainder stays below the interval afterwards.
    fn accumulate(&mut self, minutes: u32) -> Option<u32> {
        let total = u64::from(self.accumulated_minutes) + u64::from(minutes);
        let interval = u64::from(self.interval_minutes);
        let remainder = total % interval;
        self.accumulated_minutes = u32::try_from(remainder).unwrap_or(0);
        if total < interval {
            return None;
        }
        Some(u32::try_from(total - remainder).unwrap_or(u32::MAX))
    }
}

struct ClockState {
    version: u64,
    locked: bool,
    busy: bool,
    pending_minutes: u32,
    /// Every fold behind `pending_minutes` was a forced advance
    pending_forced: bool,
    last_advance_at: Option<Instant>,
    last_touched: DateTime<Utc>,
    callbacks: Vec<Registration>,
    next_token: u64,
    flush_generation: u64,
    /// Scheduled flush, tagged with its generation
    flush_task: Option<(u64, JoinHandle<()>)>,
}

impl ClockState {
    fn check(&self, options: &AdvanceOptions) -> Result<(), CoordinatorError> {
        if let Some(expected) = options.expected_version {
            if expected != self.version {
                return Err(CoordinatorError::VersionMismatch {
                    expected,
                    actual: self.version,
                });
            }
        }
        if self.locked && !options.force {
            return Err(CoordinatorError::TimeLocked);
        }
        Ok(())
    }

    fn within_debounce(&self, now: Instant, window: Duration) -> bool {
        let Some(last) = self.last_advance_at else {
            return false;
        };
        now.saturating_duration_since(last) < window && (self.busy || self.pending_minutes > 0)
    }

    fn fold(&mut self, minutes: u32, forced: bool) {
        self.pending_forced = if self.pending_minutes == 0 {
            forced
        } else {
            self.pending_forced && forced
        };
        self.pending_minutes = self.pending_minutes.saturating_add(minutes);
    }

    /// Pending minutes may move the clock unless a lock arrived after an
    /// unforced fold.
    fn pending_releasable(&self) -> bool {
        !self.locked || self.pending_forced
    }

    /// Take debounced minutes, cancelling the flush that would have applied them.
    fn take_pending(&mut self) -> (u32, bool) {
        if let Some((_, task)) = self.flush_task.take() {
            task.abort();
        }
        let forced = std::mem::take(&mut self.pending_forced);
        (std::mem::take(&mut self.pending_minutes), forced)
    }

    fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            version: self.version,
            locked: self.locked,
            busy: self.busy,
            pending_minutes: self.pending_minutes,
            callbacks: self
                .callbacks
                .iter()
                .map(|r| CallbackInfo {
                    id: r.id.clone(),
                    interval_minutes: r.interval_minutes,
                    accumulated_minutes: r.accumulated_minutes,
                })
                .collect(),
        }
    }
}

struct CampaignClock {
    gate: Arc<AsyncMutex<()>>,
    state: Mutex<ClockState>,
}

impl CampaignClock {
    fn new(version: u64, now: DateTime<Utc>) -> Self {
        Self {
            gate: Arc::new(AsyncMutex::new(())),
            state: Mutex::new(ClockState {
                version,
                locked: false,
                busy: false,
                pending_minutes: 0,
                pending_forced: false,
                last_advance_at: None,
                last_touched: now,
                callbacks: Vec::new(),
                next_token: 0,
                flush_generation: 0,
                flush_task: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a campaign busy for the lifetime of an applied advance.
struct BusyGuard<'a> {
    clock: &'a CampaignClock,
}

impl<'a> BusyGuard<'a> {
    fn enter(clock: &'a CampaignClock) -> Self {
        let mut state = clock.state();
        state.busy = true;
        state.last_advance_at = Some(Instant::now());
        Self { clock }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.clock.state().busy = false;
    }
}

// =============================================================================
// Callback Handles and Exclusive Sections
// =============================================================================

/// Removes one registration when `unregister` is called.
///
/// Re-registering the same id replaces the registration, after which older
/// handles no longer remove anything.
#[must_use]
pub struct CallbackHandle {
    campaign_id: CampaignId,
    callback_id: String,
    token: u64,
    clock: Weak<CampaignClock>,
}

impl CallbackHandle {
    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    /// Returns `true` if the registration was still present.
    pub fn unregister(self) -> bool {
        let Some(clock) = self.clock.upgrade() else {
            return false;
        };
        let mut state = clock.state();
        let before = state.callbacks.len();
        state.callbacks.retain(|r| r.token != self.token);
        let removed = state.callbacks.len() != before;
        if removed {
            tracing::debug!(
                campaign_id = %self.campaign_id,
                callback_id = %self.callback_id,
                "Unregistered interval callback"
            );
        }
        removed
    }
}

/// Holds a campaign's advance gate. No advance applies while it is alive.
pub struct CampaignSection {
    campaign_id: CampaignId,
    _gate: OwnedMutexGuard<()>,
}

impl CampaignSection {
    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }
}

// =============================================================================
// Time Coordinator
// =============================================================================

/// Registry of campaign clocks and the single entry point for advancing them.
#[derive(Clone)]
pub struct TimeCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    campaigns: Arc<dyn CampaignRepo>,
    clock: Arc<dyn ClockPort>,
    settings: ClockSettings,
    clocks: DashMap<CampaignId, Arc<CampaignClock>>,
    /// Versions of evicted campaigns, so a recreated clock never goes backwards
    retired_versions: DashMap<CampaignId, u64>,
    applied: broadcast::Sender<AdvanceReport>,
}

const APPLIED_CHANNEL_CAPACITY: usize = 64;

impl TimeCoordinator {
    pub fn new(
        campaigns: Arc<dyn CampaignRepo>,
        clock: Arc<dyn ClockPort>,
        settings: ClockSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                campaigns,
                clock,
                settings,
                clocks: DashMap::new(),
                retired_versions: DashMap::new(),
                applied: broadcast::channel(APPLIED_CHANNEL_CAPACITY).0,
            }),
        }
    }

    pub fn settings(&self) -> ClockSettings {
        self.inner.settings
    }

    /// Receive a report for every applied advance, including the ones the
    /// debounce flush applies after its callers have returned.
    pub fn subscribe(&self) -> broadcast::Receiver<AdvanceReport> {
        self.inner.applied.subscribe()
    }

    /// Register `handler` to receive elapsed time in whole multiples of
    /// `interval_minutes`.
    ///
    /// An existing registration with the same id is replaced in place and its
    /// accumulator reset.
    pub fn register_callback(
        &self,
        campaign_id: CampaignId,
        callback_id: impl Into<String>,
        interval_minutes: u32,
        handler: Arc<dyn IntervalHandler>,
    ) -> Result<CallbackHandle, CoordinatorError> {
        if interval_minutes == 0 {
            return Err(CoordinatorError::InvalidInterval);
        }
        let callback_id = callback_id.into();
        let clock = self.inner.clock_for(campaign_id);

        let token = {
            let mut state = clock.state();
            state.last_touched = self.inner.clock.now();
            let token = state.next_token;
            state.next_token += 1;

            let registration = Registration {
                token,
                id: callback_id.clone(),
                interval_minutes,
                accumulated_minutes: 0,
                handler,
            };
            match state.callbacks.iter().position(|r| r.id == callback_id) {
                Some(index) => state.callbacks[index] = registration,
                None => state.callbacks.push(registration),
            }
            token
        };

        tracing::debug!(
            campaign_id = %campaign_id,
            callback_id = %callback_id,
            interval_minutes,
            "Registered interval callback"
        );

        Ok(CallbackHandle {
            campaign_id,
            callback_id,
            token,
            clock: Arc::downgrade(&clock),
        })
    }

    /// Set the lock flag. Every call bumps the version. Returns the new version.
    pub fn set_lock(&self, campaign_id: CampaignId, locked: bool) -> u64 {
        let clock = self.inner.clock_for(campaign_id);
        let mut state = clock.state();
        state.last_touched = self.inner.clock.now();
        state.locked = locked;
        state.version += 1;
        // Minutes held back by the lock go out once it lifts
        if !locked && state.pending_minutes > 0 {
            Inner::schedule_flush(&self.inner, campaign_id, &clock, &mut state);
        }
        tracing::info!(
            campaign_id = %campaign_id,
            locked,
            version = state.version,
            "Campaign time lock changed"
        );
        state.version
    }

    pub fn is_locked(&self, campaign_id: CampaignId) -> bool {
        self.inner
            .existing(campaign_id)
            .is_some_and(|clock| clock.state().locked)
    }

    pub fn get_version(&self, campaign_id: CampaignId) -> u64 {
        match self.inner.existing(campaign_id) {
            Some(clock) => clock.state().version,
            None => self.inner.retired_version(campaign_id),
        }
    }

    pub fn snapshot(&self, campaign_id: CampaignId) -> Option<ClockSnapshot> {
        self.inner
            .existing(campaign_id)
            .map(|clock| clock.state().snapshot())
    }

    /// Advance the campaign date by `minutes` and fan out to callbacks.
    ///
    /// Checks run in order: expected version, lock, debounce. Callers that
    /// pass those wait (bounded) for any in-flight advance on the same
    /// campaign, then the checks run again before anything is applied.
    pub async fn advance(
        &self,
        campaign_id: CampaignId,
        minutes: u32,
        options: AdvanceOptions,
    ) -> Result<AdvanceOutcome, CoordinatorError> {
        if minutes == 0 {
            return Err(CoordinatorError::ZeroAdvance);
        }
        let clock = self.inner.clock_for(campaign_id);

        {
            let mut state = clock.state();
            state.last_touched = self.inner.clock.now();
            state.check(&options)?;

            if state.within_debounce(Instant::now(), self.inner.settings.debounce_window) {
                state.fold(minutes, options.force);
                Inner::schedule_flush(&self.inner, campaign_id, &clock, &mut state);
                let (pending_minutes, version) = (state.pending_minutes, state.version);
                drop(state);

                tracing::debug!(
                    campaign_id = %campaign_id,
                    minutes,
                    pending_minutes,
                    "Advance debounced"
                );
                return Ok(AdvanceOutcome::Debounced {
                    pending_minutes,
                    version,
                });
            }
        }

        let gate = self.inner.enter(campaign_id, &clock).await?;
        clock.state().check(&options)?;

        let report = self
            .inner
            .apply(campaign_id, &clock, minutes, false, &gate)
            .await?;
        Ok(AdvanceOutcome::Applied(report))
    }

    /// Wait (bounded) for exclusive access to a campaign's clock.
    ///
    /// While the section is held no advance for the campaign can apply, so
    /// the campaign date and anything keyed to it stay put.
    pub async fn exclusive(
        &self,
        campaign_id: CampaignId,
    ) -> Result<CampaignSection, CoordinatorError> {
        let clock = self.inner.clock_for(campaign_id);
        clock.state().last_touched = self.inner.clock.now();
        let gate = self.inner.enter(campaign_id, &clock).await?;
        Ok(CampaignSection {
            campaign_id,
            _gate: gate,
        })
    }

    /// Drop a campaign's clock state. Returns `true` if there was any.
    pub fn clear(&self, campaign_id: CampaignId) -> bool {
        let Some((_, clock)) = self.inner.clocks.remove(&campaign_id) else {
            return false;
        };
        let mut state = clock.state();
        let (discarded, _) = state.take_pending();
        self.inner.retire(campaign_id, state.version);
        if discarded > 0 {
            tracing::warn!(
                campaign_id = %campaign_id,
                discarded_minutes = discarded,
                "Cleared campaign clock with debounced minutes still pending"
            );
        } else {
            tracing::debug!(campaign_id = %campaign_id, "Cleared campaign clock");
        }
        true
    }

    /// Evict campaigns untouched for longer than the idle TTL.
    ///
    /// Campaigns that are locked, busy, hold pending minutes, have a held
    /// gate or still have registered callbacks are kept. Returns how many
    /// were evicted.
    pub fn evict_idle(&self) -> usize {
        let now = self.inner.clock.now();
        let Some(cutoff) = chrono::Duration::from_std(self.inner.settings.idle_ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
        else {
            return 0;
        };
        let mut evicted = Vec::new();

        self.inner.clocks.retain(|campaign_id, clock| {
            let state = clock.state();
            let idle = state.last_touched < cutoff
                && !state.locked
                && !state.busy
                && state.pending_minutes == 0
                && state.callbacks.is_empty()
                && clock.gate.try_lock().is_ok();
            if idle {
                evicted.push((*campaign_id, state.version));
            }
            !idle
        });

        for (campaign_id, version) in &evicted {
            self.inner.retire(*campaign_id, *version);
        }
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "Evicted idle campaign clocks");
        }
        evicted.len()
    }

    /// Forget retired versions of campaigns the record store no longer has.
    ///
    /// Returns how many were dropped.
    pub async fn prune_retired(&self) -> Result<usize, CoordinatorError> {
        let retired: Vec<CampaignId> = self
            .inner
            .retired_versions
            .iter()
            .map(|entry| *entry.key())
            .collect();

        let mut pruned = 0;
        for campaign_id in retired {
            if self.inner.campaigns.get(campaign_id).await?.is_some() {
                continue;
            }
            // A clock recreated meanwhile already carries the version
            if self.inner.retired_versions.remove(&campaign_id).is_some() {
                pruned += 1;
            }
        }
        if pruned > 0 {
            tracing::debug!(count = pruned, "Pruned retired campaign versions");
        }
        Ok(pruned)
    }

    pub fn campaign_count(&self) -> usize {
        self.inner.clocks.len()
    }

    pub fn retired_count(&self) -> usize {
        self.inner.retired_versions.len()
    }
}

impl Inner {
    fn clock_for(&self, campaign_id: CampaignId) -> Arc<CampaignClock> {
        let entry = self.clocks.entry(campaign_id).or_insert_with(|| {
            let version = self.retired_version(campaign_id);
            Arc::new(CampaignClock::new(version, self.clock.now()))
        });
        Arc::clone(entry.value())
    }

    fn existing(&self, campaign_id: CampaignId) -> Option<Arc<CampaignClock>> {
        self.clocks.get(&campaign_id).map(|c| Arc::clone(c.value()))
    }

    fn retired_version(&self, campaign_id: CampaignId) -> u64 {
        self.retired_versions
            .get(&campaign_id)
            .map(|v| *v.value())
            .unwrap_or(0)
    }

    fn retire(&self, campaign_id: CampaignId, version: u64) {
        if version > 0 {
            self.retired_versions.insert(campaign_id, version);
        }
    }

    async fn enter(
        &self,
        campaign_id: CampaignId,
        clock: &CampaignClock,
    ) -> Result<OwnedMutexGuard<()>, CoordinatorError> {
        let waited = self.settings.advance_timeout;
        match tokio::time::timeout(waited, Arc::clone(&clock.gate).lock_owned()).await {
            Ok(gate) => Ok(gate),
            Err(_) => {
                tracing::warn!(
                    campaign_id = %campaign_id,
                    waited_ms = waited.as_millis() as u64,
                    "Timed out waiting for campaign clock"
                );
                Err(CoordinatorError::Timeout { waited })
            }
        }
    }

    /// Apply `minutes` plus any pending minutes the lock allows. The caller
    /// holds the gate.
    async fn apply(
        &self,
        campaign_id: CampaignId,
        clock: &CampaignClock,
        minutes: u32,
        flushed: bool,
        _gate: &OwnedMutexGuard<()>,
    ) -> Result<AdvanceReport, CoordinatorError> {
        let _busy = BusyGuard::enter(clock);

        // 1. Load the campaign before touching pending minutes
        let mut campaign = self
            .campaigns
            .get(campaign_id)
            .await?
            .ok_or(CoordinatorError::CampaignNotFound(campaign_id))?;

        // 2. Fold in debounced minutes
        let (absorbed, absorbed_forced) = {
            let mut state = clock.state();
            if state.pending_releasable() {
                state.take_pending()
            } else {
                (0, false)
            }
        };
        let total = minutes.saturating_add(absorbed);
        if total == 0 {
            return Err(CoordinatorError::ZeroAdvance);
        }

        // 3. Move the calendar and persist
        let (previous_date, new_date) = campaign.advance_minutes(total);
        if let Err(e) = self.campaigns.save(&campaign).await {
            if absorbed > 0 {
                clock.state().fold(absorbed, absorbed_forced);
            }
            tracing::error!(
                campaign_id = %campaign_id,
                error = %e,
                retained_minutes = absorbed,
                "Failed to persist campaign date"
            );
            return Err(e.into());
        }

        let version = {
            let mut state = clock.state();
            state.version += 1;
            state.version
        };

        // 4. Fan out, one callback at a time
        let callbacks = fan_out(campaign_id, clock, total).await;

        tracing::info!(
            campaign_id = %campaign_id,
            minutes = total,
            absorbed_minutes = absorbed,
            version,
            new_date = %new_date,
            fired = callbacks.iter().filter(|c| c.fired()).count(),
            failed = callbacks.iter().filter(|c| c.is_failure()).count(),
            "Advanced campaign clock"
        );

        let report = AdvanceReport {
            campaign_id,
            version,
            minutes_applied: total,
            previous_date,
            new_date,
            callbacks,
            flushed,
        };
        // No subscribers is fine
        let _ = self.applied.send(report.clone());
        Ok(report)
    }

    /// Make sure a flush is scheduled for the campaign's pending minutes.
    fn schedule_flush(
        inner: &Arc<Self>,
        campaign_id: CampaignId,
        clock: &Arc<CampaignClock>,
        state: &mut ClockState,
    ) {
        if state.flush_task.is_some() {
            return;
        }
        state.flush_generation += 1;
        let generation = state.flush_generation;
        let task = Self::spawn_flush(inner, campaign_id, Arc::clone(clock), generation);
        state.flush_task = Some((generation, task));
    }

    /// Schedule the pending minutes to be applied once the window closes.
    fn spawn_flush(
        inner: &Arc<Self>,
        campaign_id: CampaignId,
        clock: Arc<CampaignClock>,
        generation: u64,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(inner);
        let window = inner.settings.debounce_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            inner.flush(campaign_id, &clock, generation).await;
        })
    }

    async fn flush(&self, campaign_id: CampaignId, clock: &CampaignClock, generation: u64) {
        // Detach first so an advance that absorbs the minutes never aborts us
        // mid-apply. A newer flush owns the slot if the generation moved on.
        {
            let mut state = clock.state();
            let owns_slot =
                matches!(state.flush_task, Some((current, _)) if current == generation);
            if !owns_slot {
                return;
            }
            state.flush_task = None;
        }

        let gate = Arc::clone(&clock.gate).lock_owned().await;
        {
            let state = clock.state();
            if state.pending_minutes == 0 {
                return;
            }
            if !state.pending_releasable() {
                tracing::info!(
                    campaign_id = %campaign_id,
                    pending_minutes = state.pending_minutes,
                    "Campaign locked, debounced minutes held back"
                );
                return;
            }
        }

        match self.apply(campaign_id, clock, 0, true, &gate).await {
            Ok(report) => tracing::debug!(
                campaign_id = %campaign_id,
                minutes = report.minutes_applied,
                version = report.version,
                "Flushed debounced minutes"
            ),
            Err(e) => tracing::warn!(
                campaign_id = %campaign_id,
                error = %e,
                "Failed to flush debounced minutes, they stay pending"
            ),
        }
    }
}

async fn fan_out(
    campaign_id: CampaignId,
    clock: &CampaignClock,
    minutes: u32,
) -> Vec<CallbackOutcome> {
    let tokens: Vec<u64> = clock.state().callbacks.iter().map(|r| r.token).collect();
    let mut outcomes = Vec::with_capacity(tokens.len());

    for token in tokens {
        let (callback_id, handler, elapsed) = {
            let mut state = clock.state();
            // Unregistered by an earlier handler in this pass
            let Some(registration) = state.callbacks.iter_mut().find(|r| r.token == token) else {
                continue;
            };
            match registration.accumulate(minutes) {
                Some(elapsed) => (
                    registration.id.clone(),
                    Arc::clone(&registration.handler),
                    elapsed,
                ),
                None => {
                    outcomes.push(CallbackOutcome {
                        callback_id: registration.id.clone(),
                        status: CallbackStatus::Accumulating {
                            accumulated_minutes: registration.accumulated_minutes,
                        },
                    });
                    continue;
                }
            }
        };

        let result = AssertUnwindSafe(handler.on_elapsed(campaign_id, elapsed))
            .catch_unwind()
            .await;
        let status = match result {
            Ok(Ok(())) => CallbackStatus::Fired {
                elapsed_minutes: elapsed,
            },
            Ok(Err(e)) => {
                tracing::warn!(
                    campaign_id = %campaign_id,
                    callback_id = %callback_id,
                    error = %e,
                    "Interval callback failed"
                );
                CallbackStatus::Failed {
                    elapsed_minutes: elapsed,
                    error: format!("{e:#}"),
                }
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    campaign_id = %campaign_id,
                    callback_id = %callback_id,
                    panic = %message,
                    "Interval callback panicked"
                );
                CallbackStatus::Failed {
                    elapsed_minutes: elapsed,
                    error: format!("handler panicked: {message}"),
                }
            }
        };
        outcomes.push(CallbackOutcome {
            callback_id,
            status,
        });
    }

    outcomes
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
