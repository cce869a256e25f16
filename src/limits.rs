use crate::model::Ms;

/// 2000-01-01T00:00:00Z
pub const MIN_VALID_TIMESTAMP_MS: Ms = 946_684_800_000;
/// 2200-01-01T00:00:00Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 7_258_118_400_000;

/// A single booking can't be wider than a week.
pub const MAX_SPAN_DURATION_MS: Ms = 7 * 24 * 3_600_000;

pub const MAX_BOOKER_LEN: usize = 128;
pub const MAX_BOOKINGS: usize = 100_000;

/// Expired bookings listed by name in one cleanup log entry.
pub const EXPIRY_SUMMARY_LIMIT: usize = 10;

/// Entries shown in the dashboard activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;
