//! Calendar-facing helpers: the workday window, hour slots, the per-day
//! schedule grid and booking-form parsing. All wall-clock math uses a fixed
//! UTC offset, so an hour slot is always exactly [`HOUR_MS`] wide.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike};

use crate::catalog::{RESOURCES, Resource};
use crate::engine::{BookingRequest, ValidationError};
use crate::model::*;

/// Bookable hours of a day, `[start_hour, end_hour)` in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkdayWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for WorkdayWindow {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 18,
        }
    }
}

impl WorkdayWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Option<Self> {
        (start_hour < end_hour && end_hour <= 24).then_some(Self { start_hour, end_hour })
    }

    pub fn hours(&self) -> std::ops::Range<u32> {
        self.start_hour..self.end_hour
    }

    pub fn span_on(&self, day: NaiveDate, offset: FixedOffset) -> Span {
        let midnight = day_start_ms(day, offset);
        Span::new(
            midnight + self.start_hour as Ms * HOUR_MS,
            midnight + self.end_hour as Ms * HOUR_MS,
        )
    }
}

/// Local midnight of `day`, as unix ms.
pub fn day_start_ms(day: NaiveDate, offset: FixedOffset) -> Ms {
    let local = day.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    local - offset.local_minus_utc() as Ms * 1000
}

/// One-hour slot starting at `hour` local time on `day`.
pub fn hour_slot(day: NaiveDate, hour: u32, offset: FixedOffset) -> Span {
    let start = day_start_ms(day, offset) + hour as Ms * HOUR_MS;
    Span::new(start, start + HOUR_MS)
}

pub fn local_datetime(ms: Ms, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.with_timezone(&offset))
}

/// Calendar day containing `ms` in local time.
pub fn day_of(ms: Ms, offset: FixedOffset) -> Option<NaiveDate> {
    local_datetime(ms, offset).map(|dt| dt.date_naive())
}

/// `Oct 20, 09:00 AM`
pub fn format_timestamp(ms: Ms, offset: FixedOffset) -> String {
    match local_datetime(ms, offset) {
        Some(dt) => dt.format("%b %-d, %I:%M %p").to_string(),
        None => ms.to_string(),
    }
}

/// `09:00 AM`
pub fn format_time(ms: Ms, offset: FixedOffset) -> String {
    match local_datetime(ms, offset) {
        Some(dt) => dt.format("%I:%M %p").to_string(),
        None => ms.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub hour: u32,
    pub span: Span,
    /// Booking overlapping this hour, if any.
    pub booking: Option<Booking>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRow {
    pub resource: &'static Resource,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub day: NaiveDate,
    pub rows: Vec<ResourceRow>,
}

impl DaySchedule {
    pub fn row(&self, resource_id: &str) -> Option<&ResourceRow> {
        self.rows.iter().find(|r| r.resource.id == resource_id)
    }
}

/// One row per catalog resource, one slot per workday hour.
pub fn build_day_schedule(
    day: NaiveDate,
    window: WorkdayWindow,
    offset: FixedOffset,
    bookings: &[Booking],
) -> DaySchedule {
    let bounds = window.span_on(day, offset);
    let in_day: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.span().overlaps(&bounds))
        .collect();

    let rows = RESOURCES
        .iter()
        .map(|resource| {
            let slots = window
                .hours()
                .map(|hour| {
                    let span = hour_slot(day, hour, offset);
                    let booking = in_day
                        .iter()
                        .find(|b| b.resource_id == resource.id && b.span().overlaps(&span))
                        .map(|b| (*b).clone());
                    SlotView { hour, span, booking }
                })
                .collect();
            ResourceRow { resource, slots }
        })
        .collect();

    DaySchedule { day, rows }
}

fn parse_time(raw: &str) -> Result<Option<NaiveTime>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    // "18:00" style; also accept a bare hour like "9"
    let parsed = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&format!("{raw}:00"), "%H:%M"))
        .map_err(|_| ValidationError::InvalidDateTime)?;
    Ok(Some(parsed))
}

/// Turn booking-form fields into a request. Enforces the form's own rules
/// (both times present, on the hour, inside the window); the engine checks the rest.
pub fn parse_booking_form(
    resource_id: &str,
    date: &str,
    start: &str,
    end: &str,
    booker_id: &str,
    window: WorkdayWindow,
    offset: FixedOffset,
) -> Result<BookingRequest, ValidationError> {
    let (Some(start), Some(end)) = (parse_time(start)?, parse_time(end)?) else {
        return Err(ValidationError::MissingTime);
    };
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDateTime)?;
    if start.minute() != 0 || end.minute() != 0 {
        return Err(ValidationError::NotHourAligned);
    }
    // 00:00 as an end time means midnight at the close of the day
    let end_hour = if end.hour() == 0 { 24 } else { end.hour() };
    if end_hour <= start.hour() {
        return Err(ValidationError::EndNotAfterStart);
    }
    if start.hour() < window.start_hour || end_hour > window.end_hour {
        return Err(ValidationError::OutsideWorkday);
    }

    let midnight = day_start_ms(day, offset);
    Ok(BookingRequest {
        resource_id: resource_id.trim().to_string(),
        start: midnight + start.hour() as Ms * HOUR_MS,
        end: midnight + end_hour as Ms * HOUR_MS,
        booker_id: booker_id.trim().to_string(),
    })
}
