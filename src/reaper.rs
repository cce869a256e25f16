use tracing::info;

use crate::engine::{Engine, EngineError};
use crate::limits::EXPIRY_SUMMARY_LIMIT;
use crate::model::*;
use crate::notify::Change;
use crate::schedule::format_timestamp;

/// Bookings removed by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<Booking>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Summary text for the cleanup log entry: at most `EXPIRY_SUMMARY_LIMIT`
/// bookings by name, then a count of the rest.
pub(crate) fn summarize(removed: &[Booking], offset: chrono::FixedOffset) -> String {
    let mut parts: Vec<String> = removed
        .iter()
        .take(EXPIRY_SUMMARY_LIMIT)
        .map(|b| format!("{} at {}", b.resource_id, format_timestamp(b.start_time, offset)))
        .collect();
    if removed.len() > EXPIRY_SUMMARY_LIMIT {
        parts.push(format!("and {} more", removed.len() - EXPIRY_SUMMARY_LIMIT));
    }
    format!("Removed {} expired booking(s): {}", removed.len(), parts.join(", "))
}

impl Engine {
    /// Drop every booking with `end_time <= now`. Writes one summary entry
    /// as `system` when anything was removed; otherwise touches nothing.
    /// Runs at startup and after pulls rather than on its own timer.
    pub async fn sweep_expired(&self) -> Result<SweepReport, EngineError> {
        let now = self.clock.now();
        let mut guard = self.state.write().await;
        if !guard.bookings.iter().any(|b| b.end_time <= now) {
            return Ok(SweepReport::default());
        }

        let mut next = guard.clone();
        let (removed, kept): (Vec<Booking>, Vec<Booking>) =
            next.bookings.drain(..).partition(|b| b.end_time <= now);
        next.bookings = kept;
        next.logs.append(
            now,
            SYSTEM_USER,
            ActivityType::ExpiredCleanup,
            summarize(&removed, self.offset),
        );
        self.persist_and_apply(&mut guard, next, Change::Expired).await?;

        metrics::counter!(crate::observability::BOOKINGS_EXPIRED_TOTAL).increment(removed.len() as u64);
        info!(count = removed.len(), "swept expired bookings");
        Ok(SweepReport { removed })
    }
}
