use crate::limits::*;
use crate::model::*;

use super::ValidationError;

/// Raw create input, as it arrives from a form or command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub resource_id: String,
    pub start: Ms,
    pub end: Ms,
    pub booker_id: String,
}

/// Check a create request against the validation rules. `now` is exclusive:
/// a booking starting exactly now is already in the past.
pub(crate) fn validate_request(req: &BookingRequest, now: Ms) -> Result<Span, ValidationError> {
    if req.resource_id.trim().is_empty() {
        return Err(ValidationError::MissingResource);
    }
    let booker = req.booker_id.trim();
    if booker.is_empty() {
        return Err(ValidationError::EmptyBooker);
    }
    if booker.len() > MAX_BOOKER_LEN {
        return Err(ValidationError::BookerTooLong);
    }
    let span = Span::try_new(req.start, req.end).ok_or(ValidationError::EndNotAfterStart)?;
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(ValidationError::OutOfRange);
    }
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(ValidationError::TooLong);
    }
    if span.start <= now {
        return Err(ValidationError::StartInPast);
    }
    Ok(span)
}

/// First booking on `resource_id` whose interval overlaps `candidate`.
pub fn find_conflict<'a>(resource_id: &str, candidate: &Span, bookings: &'a [Booking]) -> Option<&'a Booking> {
    bookings
        .iter()
        .filter(|b| b.resource_id == resource_id)
        .find(|b| b.span().overlaps(candidate))
}

/// Creation-time gate. Trim and split never call this; they only shrink
/// intervals that were already conflict-free.
pub fn has_conflict(resource_id: &str, candidate: &Span, bookings: &[Booking]) -> bool {
    find_conflict(resource_id, candidate, bookings).is_some()
}
