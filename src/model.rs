use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds. Every timestamp in the model uses it.
pub type Ms = i64;

pub const HOUR_MS: Ms = 3_600_000;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Checked constructor for untrusted input.
    pub fn try_new(start: Ms, end: Ms) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// How a cancelled slot lines up against the booking it cuts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCase {
    /// Slot covers the whole booking.
    Full,
    /// Slot covers the head of the booking.
    TrimStart,
    /// Slot covers the tail of the booking.
    TrimEnd,
    /// Slot sits strictly inside the booking.
    Split,
}

impl SlotCase {
    /// Classify `slot` against `booking`. `None` when they don't overlap
    /// or when `slot` is empty or inverted.
    pub fn classify(booking: &Span, slot: &Span) -> Option<Self> {
        if slot.start >= slot.end || !booking.overlaps(slot) {
            return None;
        }
        let covers_head = slot.start <= booking.start;
        let covers_tail = slot.end >= booking.end;
        Some(match (covers_head, covers_tail) {
            (true, true) => SlotCase::Full,
            (true, false) => SlotCase::TrimStart,
            (false, true) => SlotCase::TrimEnd,
            (false, false) => SlotCase::Split,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
}

/// A reservation of one resource over `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub resource_id: String,
    pub start_time: Ms,
    pub end_time: Ms,
    pub booker_id: String,
    pub created_at: Ms,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    pub fn span(&self) -> Span {
        Span::new(self.start_time, self.end_time)
    }

    pub fn set_span(&mut self, span: Span) {
        self.start_time = span.start;
        self.end_time = span.end;
    }
}

/// Short label describing what a log entry records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    NewBooking,
    CancelledBooking,
    BookingTrimmed,
    BookingSplit,
    BookingRemoved,
    ExpiredCleanup,
    /// Labels written by other clients that this build doesn't know.
    Other(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::NewBooking => "New Booking",
            ActivityType::CancelledBooking => "Cancelled Booking",
            ActivityType::BookingTrimmed => "Booking Trimmed",
            ActivityType::BookingSplit => "Booking Split",
            ActivityType::BookingRemoved => "Booking Removed",
            ActivityType::ExpiredCleanup => "Expired Bookings Cleanup",
            ActivityType::Other(label) => label,
        }
    }
}

impl From<String> for ActivityType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "New Booking" => ActivityType::NewBooking,
            "Cancelled Booking" => ActivityType::CancelledBooking,
            "Booking Trimmed" => ActivityType::BookingTrimmed,
            "Booking Split" => ActivityType::BookingSplit,
            "Booking Removed" => ActivityType::BookingRemoved,
            "Expired Bookings Cleanup" => ActivityType::ExpiredCleanup,
            _ => ActivityType::Other(label),
        }
    }
}

impl From<ActivityType> for String {
    fn from(kind: ActivityType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: Ms,
    pub user_id: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub details: String,
}

/// Identity used for entries written by the sweeper.
pub const SYSTEM_USER: &str = "system";

pub fn new_booking_id() -> String {
    format!("book-{}", Ulid::new())
}

pub fn new_log_id() -> String {
    format!("log-{}", Ulid::new())
}

/// The unit of persistence and remote mirroring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl Snapshot {
    /// Serialized form used for change detection.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(start: Ms, end: Ms) -> Booking {
        Booking {
            id: new_booking_id(),
            resource_id: "PC-1".into(),
            start_time: start,
            end_time: end,
            booker_id: "alice".into(),
            created_at: 0,
            status: BookingStatus::Confirmed,
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn span_contains_span() {
        let outer = Span::new(100, 400);
        let inner = Span::new(150, 300);
        let partial = Span::new(50, 200);
        assert!(outer.contains_span(&inner));
        assert!(outer.contains_span(&outer));
        assert!(!outer.contains_span(&partial));
    }

    #[test]
    fn try_new_rejects_empty_and_inverted() {
        assert!(Span::try_new(5, 5).is_none());
        assert!(Span::try_new(6, 5).is_none());
        assert_eq!(Span::try_new(5, 6), Some(Span::new(5, 6)));
    }

    #[test]
    fn slot_case_classification() {
        let b = Span::new(9 * HOUR_MS, 12 * HOUR_MS);
        let at = |s: Ms, e: Ms| SlotCase::classify(&b, &Span::new(s * HOUR_MS, e * HOUR_MS));

        assert_eq!(at(9, 12), Some(SlotCase::Full));
        assert_eq!(at(8, 13), Some(SlotCase::Full));
        assert_eq!(at(9, 10), Some(SlotCase::TrimStart));
        assert_eq!(at(8, 10), Some(SlotCase::TrimStart));
        assert_eq!(at(11, 12), Some(SlotCase::TrimEnd));
        assert_eq!(at(11, 14), Some(SlotCase::TrimEnd));
        assert_eq!(at(10, 11), Some(SlotCase::Split));
        assert_eq!(at(12, 13), None);
        assert_eq!(at(7, 9), None);
    }

    #[test]
    fn empty_or_inverted_slot_is_not_classified() {
        let b = Span::new(9 * HOUR_MS, 12 * HOUR_MS);
        let inverted = Span {
            start: 11 * HOUR_MS,
            end: 10 * HOUR_MS,
        };
        let empty = Span {
            start: 10 * HOUR_MS,
            end: 10 * HOUR_MS,
        };
        assert_eq!(SlotCase::classify(&b, &inverted), None);
        assert_eq!(SlotCase::classify(&b, &empty), None);
    }

    #[test]
    fn booking_wire_shape_is_camel_case() {
        let b = booking(1000, 2000);
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["resourceId"], "PC-1");
        assert_eq!(json["startTime"], 1000);
        assert_eq!(json["endTime"], 2000);
        assert_eq!(json["bookerId"], "alice");
        assert_eq!(json["status"], "confirmed");
    }

    #[test]
    fn activity_type_keeps_unknown_labels() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"id":"log-1","timestamp":5,"userId":"bob","activityType":"User Logout","details":""}"#,
        )
        .unwrap();
        assert_eq!(entry.activity_type, ActivityType::Other("User Logout".into()));
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["activityType"], "User Logout");

        let known: ActivityType = String::from("Booking Split").into();
        assert_eq!(known, ActivityType::BookingSplit);
    }

    #[test]
    fn ids_are_prefixed_and_unique() {
        let a = new_booking_id();
        let b = new_booking_id();
        assert!(a.starts_with("book-"));
        assert_ne!(a, b);
        assert!(new_log_id().starts_with("log-"));
    }

    #[test]
    fn snapshot_missing_fields_default_to_empty() {
        let snap: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.bookings.is_empty());
        assert!(snap.logs.is_empty());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut snap = Snapshot::default();
        let before = snap.fingerprint();
        snap.bookings.push(booking(0, 10));
        assert_ne!(before, snap.fingerprint());
    }
}
