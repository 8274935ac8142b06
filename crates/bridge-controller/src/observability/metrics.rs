//! Metrics definitions for the Bridge Controller per ADR-0011
//!
//! All metrics follow Prometheus naming conventions:
//! - `bc_` prefix for Bridge Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// ADR-0011: Must be called before any metrics are recorded.
/// Engine latency buckets are sized for internal service calls.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("bc_engine".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set engine latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Set the number of bridges managed by the controller.
///
/// Metric: `bc_bridges_active`
/// Labels: none
pub fn set_bridges_active(count: usize) {
    // usize to f64 conversion is safe for realistic bridge counts
    #[allow(clippy::cast_precision_loss)]
    gauge!("bc_bridges_active").set(count as f64);
}

/// Record the outcome of an engine request.
///
/// Metric: `bc_bridge_operations_total`
/// Labels: `operation`, `status`
pub fn record_bridge_operation(operation: &'static str, status: &'static str) {
    counter!(
        "bc_bridge_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

/// Record engine request latency.
///
/// Metric: `bc_engine_latency_seconds`
/// Labels: `operation`
pub fn record_engine_latency(operation: &'static str, duration: Duration) {
    histogram!("bc_engine_latency_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}

/// Record a join or leave announcement.
///
/// Metric: `bc_playbacks_total`
/// Labels: `kind` (join, leave), `status`
pub fn record_playback(kind: &'static str, status: &'static str) {
    counter!("bc_playbacks_total", "kind" => kind, "status" => status).increment(1);
}

/// Record a bridge event the controller did not act on.
///
/// Metric: `bc_events_ignored_total`
/// Labels: `reason`
pub fn record_event_ignored(reason: &'static str) {
    counter!("bc_events_ignored_total", "reason" => reason).increment(1);
}
