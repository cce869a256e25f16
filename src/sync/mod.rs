//! Reconciliation with the remote mirror.
//!
//! Each cycle is `Idle -> Pushing -> Pulling -> Reconciled | Failed`. A pull
//! replaces local state with the remote snapshot wholesale (remote wins once
//! fetched); there is no field-level merge. Two instances pushing and pulling
//! concurrently converge eventually but are not linearizable: a slower push
//! can overwrite a faster one's changes, and edits made between our push and
//! our pull are discarded by the pull.

mod error;
pub mod mirror;
pub mod remote;
pub mod wire;

pub use error::SyncError;
pub use remote::{HttpRemote, RemoteMirror};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::model::Snapshot;
use crate::notify::Change;
use crate::observability::{POLLS_SKIPPED_TOTAL, SYNC_DURATION_SECONDS, SYNC_PULL_TOTAL, SYNC_PUSH_TOTAL};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Pushing,
    Pulling,
    Reconciled,
    Failed,
}

/// Result of a manual "sync now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    PushedOnly,
    PulledOnly,
    Failed,
}

impl SyncOutcome {
    fn from_phases(pushed: bool, pulled: bool) -> Self {
        match (pushed, pulled) {
            (true, true) => SyncOutcome::Synced,
            (true, false) => SyncOutcome::PushedOnly,
            (false, true) => SyncOutcome::PulledOnly,
            (false, false) => SyncOutcome::Failed,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SyncOutcome::Synced => "Synced with the shared schedule.",
            SyncOutcome::PushedOnly => "Uploaded local changes, but could not fetch the shared schedule.",
            SyncOutcome::PulledOnly => "Fetched the shared schedule, but could not upload local changes.",
            SyncOutcome::Failed => "Sync failed. Working offline with local data.",
        }
    }
}

/// Result of one background poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A previous poll was still in flight.
    Skipped,
    Unchanged,
    /// Remote differed; state replaced and expired bookings swept.
    Changed,
    Failed,
}

/// Push one snapshot, recording the result. Failures are logged as warnings.
pub(crate) async fn push_logged(remote: &dyn RemoteMirror, snapshot: &Snapshot) -> Result<(), SyncError> {
    let started = Instant::now();
    let result = remote.push(snapshot).await;
    metrics::histogram!(SYNC_DURATION_SECONDS, "phase" => "push").record(started.elapsed().as_secs_f64());
    match &result {
        Ok(()) => {
            metrics::counter!(SYNC_PUSH_TOTAL, "status" => "ok").increment(1);
            debug!(bookings = snapshot.bookings.len(), "pushed snapshot");
        }
        Err(e) => {
            metrics::counter!(SYNC_PUSH_TOTAL, "status" => "error").increment(1);
            warn!("push to remote failed: {e}");
        }
    }
    result
}

/// Clears the in-flight flag when the poll finishes, is cancelled, or panics.
struct InFlight<'a>(&'a AtomicBool);

impl InFlight<'_> {
    fn acquire(flag: &AtomicBool) -> Option<InFlight<'_>> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncController {
    engine: Arc<Engine>,
    remote: Arc<dyn RemoteMirror>,
    in_flight: AtomicBool,
    phase: watch::Sender<SyncPhase>,
    poll_interval: Duration,
}

impl SyncController {
    pub fn new(engine: Arc<Engine>, remote: Arc<dyn RemoteMirror>, poll_interval: Duration) -> Self {
        Self {
            engine,
            remote,
            in_flight: AtomicBool::new(false),
            phase: watch::channel(SyncPhase::Idle).0,
            poll_interval,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.phase.send_replace(phase);
    }

    /// Send the full local snapshot.
    pub async fn push(&self) -> Result<(), SyncError> {
        self.set_phase(SyncPhase::Pushing);
        let snapshot = self.engine.snapshot().await;
        push_logged(self.remote.as_ref(), &snapshot).await
    }

    /// Fetch the remote snapshot and replace local state with it.
    /// Returns whether local state changed.
    pub async fn pull(&self) -> Result<bool, SyncError> {
        self.set_phase(SyncPhase::Pulling);
        let started = Instant::now();
        let result = match self.remote.pull().await {
            Ok(snapshot) => self
                .engine
                .replace_snapshot(snapshot)
                .await
                .map_err(|e| SyncError::Storage(e.to_string())),
            Err(e) => Err(e),
        };
        metrics::histogram!(SYNC_DURATION_SECONDS, "phase" => "pull").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(changed) => {
                metrics::counter!(SYNC_PULL_TOTAL, "status" => "ok").increment(1);
                debug!(changed, "pulled snapshot");
            }
            Err(e) => {
                metrics::counter!(SYNC_PULL_TOTAL, "status" => "error").increment(1);
                warn!("pull from remote failed: {e}");
            }
        }
        self.set_phase(if result.is_ok() { SyncPhase::Reconciled } else { SyncPhase::Failed });
        result
    }

    /// Background pull. Skipped entirely if another poll is still running.
    /// Sweeps expired bookings only when the pull changed something.
    pub async fn poll_once(&self) -> PollOutcome {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            metrics::counter!(POLLS_SKIPPED_TOTAL).increment(1);
            debug!("poll skipped: previous pull still in flight");
            return PollOutcome::Skipped;
        };

        match self.pull().await {
            Ok(true) => {
                if let Err(e) = self.engine.sweep_expired().await {
                    warn!("expiry sweep after poll failed: {e}");
                }
                PollOutcome::Changed
            }
            Ok(false) => PollOutcome::Unchanged,
            Err(_) => PollOutcome::Failed,
        }
    }

    /// Manual push-then-pull. Each phase fails independently; the sweep and
    /// re-render happen regardless.
    pub async fn sync_now(&self) -> SyncOutcome {
        let pushed = self.push().await.is_ok();
        let pulled = self.pull().await.is_ok();
        if let Err(e) = self.engine.sweep_expired().await {
            warn!("expiry sweep after sync failed: {e}");
        }
        self.engine.notify.send(Change::Replaced);

        let outcome = SyncOutcome::from_phases(pushed, pulled);
        info!(?outcome, "manual sync finished");
        outcome
    }

    /// Poll forever at `poll_interval`; the first tick fires immediately.
    /// Each tick runs in its own task so a slow pull can't delay the timer;
    /// the in-flight guard makes overlapping ticks no-ops.
    pub async fn run_poller(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let this = self.clone();
            tokio::spawn(async move {
                this.poll_once().await;
            });
        }
    }
}
