use std::net::SocketAddr;

use crate::engine::EngineError;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: engine operations. Labels: op, status.
pub const OPERATIONS_TOTAL: &str = "slotbook_operations_total";

// ── Notifier ────────────────────────────────────────────────────

/// Gauge: currently subscribed observers.
pub const SUBSCRIBERS_ACTIVE: &str = "slotbook_subscribers_active";

/// Counter: notifications handed to a subscriber channel.
pub const NOTIFICATIONS_DELIVERED_TOTAL: &str = "slotbook_notifications_delivered_total";

/// Counter: notifications a lagging subscriber missed.
pub const NOTIFICATIONS_DROPPED_TOTAL: &str = "slotbook_notifications_dropped_total";

// ── Storage ─────────────────────────────────────────────────────

/// Histogram: WAL append + fsync duration in seconds.
pub const WAL_APPEND_DURATION_SECONDS: &str = "slotbook_wal_append_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Status label for an operation outcome.
pub fn status_label<T>(result: &Result<T, EngineError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    }
}

pub fn record_outcome<T>(op: &'static str, result: &Result<T, EngineError>) {
    metrics::counter!(OPERATIONS_TOTAL, "op" => op, "status" => status_label(result)).increment(1);
}
