//! Ingest boundary for remote snapshots.
//!
//! The mirror is spreadsheet-backed, so numbers come back as numbers,
//! numeric strings, floats, or ISO-8601 text depending on how a cell was
//! last edited. Nothing from the wire reaches the engine until it has been
//! coerced into the typed model here. Records that can't be coerced are
//! dropped and counted; one bad row doesn't fail the whole pull.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::model::*;

use super::SyncError;

/// A scalar in whatever shape the store handed back.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    fn to_ms(&self) -> Option<Ms> {
        match self {
            Loose::Int(v) => Some(*v),
            Loose::Float(v) if v.is_finite() => Some(v.round() as Ms),
            Loose::Float(_) => None,
            Loose::Text(s) => {
                let s = s.trim();
                s.parse::<Ms>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.round() as Ms))
                    .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp_millis()))
            }
        }
    }

    fn into_text(self) -> String {
        match self {
            Loose::Int(v) => v.to_string(),
            Loose::Float(v) if v.fract() == 0.0 => format!("{v:.0}"),
            Loose::Float(v) => v.to_string(),
            Loose::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBooking {
    id: Loose,
    resource_id: Loose,
    start_time: Loose,
    end_time: Loose,
    #[serde(default)]
    booker_id: Option<Loose>,
    #[serde(default)]
    created_at: Option<Loose>,
}

impl RawBooking {
    fn coerce(self) -> Option<Booking> {
        let start_time = self.start_time.to_ms()?;
        let end_time = self.end_time.to_ms()?;
        Span::try_new(start_time, end_time)?;
        let id = self.id.into_text();
        let resource_id = self.resource_id.into_text();
        if id.is_empty() || resource_id.is_empty() {
            return None;
        }
        Some(Booking {
            id,
            resource_id,
            start_time,
            end_time,
            booker_id: self.booker_id.map(Loose::into_text).unwrap_or_default(),
            created_at: self.created_at.and_then(|c| c.to_ms()).unwrap_or(start_time),
            status: BookingStatus::Confirmed,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogEntry {
    id: Loose,
    timestamp: Loose,
    #[serde(default)]
    user_id: Option<Loose>,
    activity_type: String,
    #[serde(default)]
    details: Option<Loose>,
}

impl RawLogEntry {
    fn coerce(self) -> Option<LogEntry> {
        let timestamp = self.timestamp.to_ms()?;
        Some(LogEntry {
            id: self.id.into_text(),
            timestamp,
            user_id: self.user_id.map(Loose::into_text).unwrap_or_default(),
            activity_type: ActivityType::from(self.activity_type),
            details: self.details.map(Loose::into_text).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    bookings: Vec<Value>,
    #[serde(default)]
    logs: Vec<Value>,
}

/// Outcome of coercing a remote body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub snapshot: Snapshot,
    pub dropped_bookings: usize,
    pub dropped_logs: usize,
}

fn coerce_all<R, T>(values: Vec<Value>, coerce: impl Fn(R) -> Option<T>) -> (Vec<T>, usize)
where
    R: for<'de> Deserialize<'de>,
{
    let mut out = Vec::with_capacity(values.len());
    let mut dropped = 0;
    for value in values {
        match serde_json::from_value::<R>(value).ok().and_then(&coerce) {
            Some(item) => out.push(item),
            None => dropped += 1,
        }
    }
    (out, dropped)
}

/// Parse and coerce a `{bookings, logs}` body.
pub fn decode_snapshot(body: &[u8]) -> Result<Decoded, SyncError> {
    let raw: RawSnapshot = serde_json::from_slice(body).map_err(|e| SyncError::Decode(e.to_string()))?;
    let (bookings, dropped_bookings) = coerce_all(raw.bookings, RawBooking::coerce);
    let (logs, dropped_logs) = coerce_all(raw.logs, RawLogEntry::coerce);
    if dropped_bookings > 0 || dropped_logs > 0 {
        warn!(dropped_bookings, dropped_logs, "dropped malformed records from remote snapshot");
    }
    Ok(Decoded {
        snapshot: Snapshot { bookings, logs },
        dropped_bookings,
        dropped_logs,
    })
}
