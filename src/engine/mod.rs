mod conflict;
mod error;
mod mutations;
mod queries;

pub use conflict::{BookingRequest, find_conflict, has_conflict};
pub use error::{EngineError, ValidationError};
pub use mutations::SlotOutcome;
pub use queries::ResourceStatus;

use std::io;
use std::sync::Arc;

use chrono::FixedOffset;
use tokio::sync::RwLock;

use crate::activity::ActivityLog;
use crate::clock::Clock;
use crate::model::*;
use crate::notify::{Change, NotifyHub};
use crate::store::{SNAPSHOT_KEY, SnapshotStore};
use crate::sync::mirror::MirrorHandle;

/// In-memory bookings and log. Bookings are kept sorted by `start_time`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub bookings: Vec<Booking>,
    pub logs: ActivityLog,
}

impl AppState {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut bookings = snapshot.bookings;
        bookings.sort_by_key(|b| b.start_time);
        Self {
            bookings,
            logs: ActivityLog::from_entries(snapshot.logs),
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            bookings: self.bookings.clone(),
            logs: self.logs.entries().to_vec(),
        }
    }

    /// Insert booking maintaining sort order by start_time.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .partition_point(|b| b.start_time <= booking.start_time);
        self.bookings.insert(pos, booking);
    }

    /// Remove booking by id.
    pub fn remove_booking(&mut self, id: &str) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    pub fn booking_mut(&mut self, id: &str) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Restore start_time order after an in-place trim.
    pub(crate) fn resort(&mut self) {
        self.bookings.sort_by_key(|b| b.start_time);
    }
}

/// Owns application state. Every mutation is staged on a copy, persisted to
/// the local store, swapped in, then handed to the mirror for a best-effort push.
pub struct Engine {
    pub(super) state: RwLock<AppState>,
    store: Arc<dyn SnapshotStore>,
    pub(super) clock: Arc<dyn Clock>,
    mirror: Option<MirrorHandle>,
    pub notify: Arc<NotifyHub>,
    /// Offset used to render times in log details.
    pub(super) offset: FixedOffset,
}

impl Engine {
    /// Load state from `store` (empty if the key is absent).
    pub fn open(
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        notify: Arc<NotifyHub>,
    ) -> io::Result<Self> {
        let state = match store.get(SNAPSHOT_KEY)? {
            Some(snapshot) => AppState::from_snapshot(snapshot),
            None => AppState::default(),
        };
        tracing::info!(
            bookings = state.bookings.len(),
            logs = state.logs.len(),
            "loaded local snapshot"
        );
        Ok(Self {
            state: RwLock::new(state),
            store,
            clock,
            mirror: None,
            notify,
            offset,
        })
    }

    /// Attach a mirror; committed mutations are queued on it.
    pub fn with_mirror(mut self, mirror: MirrorHandle) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn mirror(&self) -> Option<&MirrorHandle> {
        self.mirror.as_ref()
    }

    pub fn now(&self) -> Ms {
        self.clock.now()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.to_snapshot()
    }

    /// Run the store write on the blocking pool; `FileStore` fsyncs.
    /// Callers keep the state write lock across the await so writes land in
    /// commit order.
    async fn write_snapshot(&self, snapshot: Snapshot) -> Result<Snapshot, EngineError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.set(SNAPSHOT_KEY, &snapshot).map(|()| snapshot))
            .await
            .map_err(|e| EngineError::Storage(format!("store write aborted: {e}")))?
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    /// Persist + swap + notify + queue push. Nothing is applied if the store write fails.
    pub(super) async fn persist_and_apply(
        &self,
        current: &mut AppState,
        next: AppState,
        change: Change,
    ) -> Result<(), EngineError> {
        let snapshot = self.write_snapshot(next.to_snapshot()).await?;
        *current = next;
        metrics::gauge!(crate::observability::BOOKINGS_ACTIVE).set(current.bookings.len() as f64);
        self.notify.send(change);
        if let Some(mirror) = &self.mirror {
            mirror.enqueue(snapshot);
        }
        Ok(())
    }

    /// Whole-snapshot replace from a remote pull. No push is queued.
    /// Returns whether the serialized state changed.
    pub async fn replace_snapshot(&self, snapshot: Snapshot) -> Result<bool, EngineError> {
        let mut guard = self.state.write().await;
        let before = guard.to_snapshot().fingerprint();
        let next = AppState::from_snapshot(snapshot);
        let after = next.to_snapshot();
        let changed = before != after.fingerprint();

        self.write_snapshot(after).await?;
        *guard = next;
        metrics::gauge!(crate::observability::BOOKINGS_ACTIVE).set(guard.bookings.len() as f64);
        if changed {
            self.notify.send(Change::Replaced);
        }
        Ok(changed)
    }
}
