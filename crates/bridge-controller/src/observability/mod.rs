//! Observability module for the Bridge Controller
//!
//! Implements metrics and log setup per ADR-0011 (Observability Framework).
//!
//! Metric labels are bounded to prevent cardinality explosion:
//! - `operation`: engine request names (list_bridges, create_bridge, ...)
//! - `status`: success, error
//! - `kind`: join, leave
//! - `reason`: unmanaged_bridge
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `bc_bridges_active` | Gauge | none | Bridges managed by the controller |
//! | `bc_bridge_operations_total` | Counter | `operation`, `status` | Engine request outcomes |
//! | `bc_engine_latency_seconds` | Histogram | `operation` | Engine request latency |
//! | `bc_playbacks_total` | Counter | `kind`, `status` | Join/leave announcements |
//! | `bc_events_ignored_total` | Counter | `reason` | Bridge events filtered out |

pub mod logging;
pub mod metrics;

// Re-exports for convenience
pub use logging::init_tracing;
pub use metrics::{
    init_metrics_recorder, record_bridge_operation, record_engine_latency, record_event_ignored,
    record_playback, set_bridges_active,
};
