use chrono::NaiveDate;

use crate::catalog::{RESOURCES, Resource};
use crate::model::*;
use crate::schedule::{DaySchedule, WorkdayWindow, build_day_schedule};

use super::Engine;

/// Dashboard status for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Occupied { until: Ms },
    Available { next: Option<Ms> },
}

pub(crate) fn status_at(bookings: &[Booking], resource_id: &str, now: Ms) -> ResourceStatus {
    let mut next: Option<Ms> = None;
    for b in bookings.iter().filter(|b| b.resource_id == resource_id) {
        if b.span().contains_instant(now) {
            return ResourceStatus::Occupied { until: b.end_time };
        }
        if b.start_time > now {
            next = Some(next.map_or(b.start_time, |n| n.min(b.start_time)));
        }
    }
    ResourceStatus::Available { next }
}

impl Engine {
    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.read().await.bookings.clone()
    }

    pub async fn get_booking(&self, id: &str) -> Option<Booking> {
        self.state
            .read()
            .await
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub async fn bookings_for(&self, resource_id: &str) -> Vec<Booking> {
        self.state
            .read()
            .await
            .bookings
            .iter()
            .filter(|b| b.resource_id == resource_id)
            .cloned()
            .collect()
    }

    /// Bookings overlapping `window`, any resource, sorted by start.
    pub async fn bookings_in(&self, window: &Span) -> Vec<Booking> {
        let guard = self.state.read().await;
        let right_bound = guard
            .bookings
            .partition_point(|b| b.start_time < window.end);
        guard.bookings[..right_bound]
            .iter()
            .filter(|b| b.end_time > window.start)
            .cloned()
            .collect()
    }

    pub async fn resource_status(&self, resource_id: &str) -> ResourceStatus {
        let now = self.clock.now();
        status_at(&self.state.read().await.bookings, resource_id, now)
    }

    /// Status of every catalog resource, in catalog order.
    pub async fn dashboard(&self) -> Vec<(&'static Resource, ResourceStatus)> {
        let now = self.clock.now();
        let guard = self.state.read().await;
        RESOURCES
            .iter()
            .map(|r| (r, status_at(&guard.bookings, r.id, now)))
            .collect()
    }

    /// Log entries, newest first.
    pub async fn logs(&self) -> Vec<LogEntry> {
        self.state
            .read()
            .await
            .logs
            .sorted()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn recent_activity(&self, n: usize) -> Vec<LogEntry> {
        self.state
            .read()
            .await
            .logs
            .recent(n)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn day_schedule(&self, day: NaiveDate, window: WorkdayWindow) -> DaySchedule {
        let guard = self.state.read().await;
        build_day_schedule(day, window, self.offset, &guard.bookings)
    }
}
