use tracing::{debug, info};

use crate::limits::MAX_BOOKINGS;
use crate::model::*;
use crate::notify::Change;
use crate::schedule::{format_time, format_timestamp};

use super::conflict::{BookingRequest, find_conflict, validate_request};
use super::{Engine, EngineError};

/// Result of cancelling a slot out of a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Slot covered the whole booking; it is gone.
    Deleted(Booking),
    /// Booking now starts at the slot's end.
    TrimmedStart(Booking),
    /// Booking now ends at the slot's start.
    TrimmedEnd(Booking),
    /// Booking now ends at the slot's start; `tail` covers the rest.
    Split { head: Booking, tail: Booking },
    /// Slot didn't overlap the booking. Nothing changed.
    Untouched,
}

impl SlotOutcome {
    pub fn case(&self) -> Option<SlotCase> {
        match self {
            SlotOutcome::Deleted(_) => Some(SlotCase::Full),
            SlotOutcome::TrimmedStart(_) => Some(SlotCase::TrimStart),
            SlotOutcome::TrimmedEnd(_) => Some(SlotCase::TrimEnd),
            SlotOutcome::Split { .. } => Some(SlotCase::Split),
            SlotOutcome::Untouched => None,
        }
    }
}

impl Engine {
    pub async fn create_booking(&self, req: BookingRequest) -> Result<Booking, EngineError> {
        let now = self.clock.now();
        let span = validate_request(&req, now)?;
        let resource_id = req.resource_id.trim().to_string();
        let booker_id = req.booker_id.trim().to_string();

        let mut guard = self.state.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS {
            return Err(EngineError::LimitExceeded("too many bookings"));
        }
        if let Some(existing) = find_conflict(&resource_id, &span, &guard.bookings) {
            metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(EngineError::Conflict(existing.id.clone()));
        }

        let booking = Booking {
            id: new_booking_id(),
            resource_id,
            start_time: span.start,
            end_time: span.end,
            booker_id,
            created_at: now,
            status: BookingStatus::Confirmed,
        };

        let mut next = guard.clone();
        next.insert_booking(booking.clone());
        next.logs.append(
            now,
            &booking.booker_id,
            ActivityType::NewBooking,
            format!("{} for {}", booking.resource_id, format_timestamp(span.start, self.offset)),
        );
        self.persist_and_apply(&mut guard, next, Change::Bookings).await?;

        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);
        info!(id = %booking.id, resource = %booking.resource_id, "booking created");
        Ok(booking)
    }

    /// Cancel `slot` out of booking `id`: delete, trim the head, trim the
    /// tail, or split, depending on how the slot lines up. The log entry is
    /// attributed to the booking's own booker.
    pub async fn cancel_slot(&self, id: &str, slot: Span) -> Result<SlotOutcome, EngineError> {
        let now = self.clock.now();
        let mut guard = self.state.write().await;
        let original = guard
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let span = original.span();
        if slot.start >= slot.end {
            debug!(id, slot_start = slot.start, slot_end = slot.end, "empty or inverted slot ignored");
            return Ok(SlotOutcome::Untouched);
        }

        let Some(case) = SlotCase::classify(&span, &slot) else {
            debug!(id, slot_start = slot.start, slot_end = slot.end, "slot does not overlap booking");
            return Ok(SlotOutcome::Untouched);
        };

        let mut next = guard.clone();
        let resource = &original.resource_id;
        let (outcome, activity, details) = match case {
            SlotCase::Full => {
                next.remove_booking(id);
                (
                    SlotOutcome::Deleted(original.clone()),
                    ActivityType::CancelledBooking,
                    format!("{resource} at {}", format_timestamp(span.start, self.offset)),
                )
            }
            SlotCase::TrimStart => {
                let trimmed = Span::new(slot.end, span.end);
                let booking = self.reshape(&mut next, id, trimmed)?;
                (
                    SlotOutcome::TrimmedStart(booking),
                    ActivityType::BookingTrimmed,
                    self.trim_details(resource, &span, &trimmed),
                )
            }
            SlotCase::TrimEnd => {
                let trimmed = Span::new(span.start, slot.start);
                let booking = self.reshape(&mut next, id, trimmed)?;
                (
                    SlotOutcome::TrimmedEnd(booking),
                    ActivityType::BookingTrimmed,
                    self.trim_details(resource, &span, &trimmed),
                )
            }
            SlotCase::Split => {
                let head = self.reshape(&mut next, id, Span::new(span.start, slot.start))?;
                let tail = Booking {
                    id: new_booking_id(),
                    start_time: slot.end,
                    end_time: span.end,
                    created_at: now,
                    ..original.clone()
                };
                next.insert_booking(tail.clone());
                let details = format!(
                    "{resource} {}-{} freed; kept {}-{} and {}-{}",
                    format_timestamp(slot.start, self.offset),
                    format_time(slot.end, self.offset),
                    format_time(head.start_time, self.offset),
                    format_time(head.end_time, self.offset),
                    format_time(tail.start_time, self.offset),
                    format_time(tail.end_time, self.offset),
                );
                (SlotOutcome::Split { head, tail }, ActivityType::BookingSplit, details)
            }
        };
        next.logs.append(now, &original.booker_id, activity, details);
        self.persist_and_apply(&mut guard, next, Change::Bookings).await?;

        metrics::counter!(
            crate::observability::SLOT_CANCELLATIONS_TOTAL,
            "case" => crate::observability::slot_case_label(case)
        )
        .increment(1);
        info!(id, case = crate::observability::slot_case_label(case), "slot cancelled");
        Ok(outcome)
    }

    /// Management-view delete: drops the booking whatever its time.
    pub async fn remove_booking(&self, id: &str, actor: &str) -> Result<Booking, EngineError> {
        let now = self.clock.now();
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        let removed = next
            .remove_booking(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        next.logs.append(
            now,
            actor,
            ActivityType::BookingRemoved,
            format!(
                "{} at {} (booked by {})",
                removed.resource_id,
                format_timestamp(removed.start_time, self.offset),
                removed.booker_id
            ),
        );
        self.persist_and_apply(&mut guard, next, Change::Bookings).await?;
        info!(id, actor, "booking removed");
        Ok(removed)
    }

    fn reshape(&self, state: &mut super::AppState, id: &str, span: Span) -> Result<Booking, EngineError> {
        let booking = state
            .booking_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        booking.set_span(span);
        let updated = booking.clone();
        state.resort();
        Ok(updated)
    }

    fn trim_details(&self, resource: &str, before: &Span, after: &Span) -> String {
        format!(
            "{resource} {}-{} now {}-{}",
            format_timestamp(before.start, self.offset),
            format_time(before.end, self.offset),
            format_time(after.start, self.offset),
            format_time(after.end, self.offset),
        )
    }
}
