use std::net::SocketAddr;

use crate::model::SlotCase;

// ── Booking lifecycle ───────────────────────────────────────────

/// Counter: bookings created.
pub const BOOKINGS_CREATED_TOTAL: &str = "slotbook_bookings_created_total";

/// Counter: create attempts rejected for overlapping an existing booking.
pub const BOOKING_CONFLICTS_TOTAL: &str = "slotbook_booking_conflicts_total";

/// Counter: slot cancellations. Labels: case.
pub const SLOT_CANCELLATIONS_TOTAL: &str = "slotbook_slot_cancellations_total";

/// Counter: bookings removed by the expiry sweep.
pub const BOOKINGS_EXPIRED_TOTAL: &str = "slotbook_bookings_expired_total";

/// Gauge: bookings currently held in memory.
pub const BOOKINGS_ACTIVE: &str = "slotbook_bookings_active";

// ── Sync ────────────────────────────────────────────────────────

/// Counter: pushes to the remote mirror. Labels: status.
pub const SYNC_PUSH_TOTAL: &str = "slotbook_sync_push_total";

/// Counter: pulls from the remote mirror. Labels: status.
pub const SYNC_PULL_TOTAL: &str = "slotbook_sync_pull_total";

/// Histogram: push/pull latency in seconds. Labels: phase.
pub const SYNC_DURATION_SECONDS: &str = "slotbook_sync_duration_seconds";

/// Counter: poll ticks skipped because a pull was still in flight.
pub const POLLS_SKIPPED_TOTAL: &str = "slotbook_polls_skipped_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a SlotCase to a short label for metrics.
pub fn slot_case_label(case: SlotCase) -> &'static str {
    match case {
        SlotCase::Full => "full",
        SlotCase::TrimStart => "trim_start",
        SlotCase::TrimEnd => "trim_end",
        SlotCase::Split => "split",
    }
}
