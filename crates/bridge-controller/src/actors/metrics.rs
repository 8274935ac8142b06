//! Actor metrics and mailbox monitoring.
//!
//! Mailbox depth thresholds for the controller actor:
//!
//! | Normal | Warning | Critical |
//! |--------|---------|----------|
//! | < 100  | 100-500 | > 500    |
//!
//! Counters here are in-process and read by tests and status queries.
//! Prometheus metrics live in [`crate::observability`].

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Mailbox depth thresholds for the controller actor.
pub const CONTROLLER_MAILBOX_NORMAL: usize = 100;
pub const CONTROLLER_MAILBOX_WARNING: usize = 500;

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    /// Below normal threshold.
    Normal,
    /// Between normal and warning thresholds.
    Warning,
    /// Above warning threshold.
    Critical,
}

/// Mailbox monitor for tracking queue depth.
#[derive(Debug)]
pub struct MailboxMonitor {
    /// Actor identifier (controller id).
    actor_id: String,
    /// Current mailbox depth.
    depth: AtomicUsize,
    /// Peak mailbox depth since last reset.
    peak_depth: AtomicUsize,
    /// Total messages processed.
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Record a message being added to the mailbox.
    pub fn record_enqueue(&self) {
        let new_depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;

        let mut current_peak = self.peak_depth.load(Ordering::Relaxed);
        while new_depth > current_peak {
            match self.peak_depth.compare_exchange_weak(
                current_peak,
                new_depth,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_peak = actual,
            }
        }

        let level = level_for_depth(new_depth);
        if level == MailboxLevel::Critical {
            warn!(
                target: "bc.actor.mailbox",
                actor_id = %self.actor_id,
                depth = new_depth,
                threshold = CONTROLLER_MAILBOX_WARNING,
                "Mailbox depth critical"
            );
        } else if level == MailboxLevel::Warning && new_depth == CONTROLLER_MAILBOX_NORMAL + 1 {
            // Log once when crossing the warning threshold
            debug!(
                target: "bc.actor.mailbox",
                actor_id = %self.actor_id,
                depth = new_depth,
                "Mailbox depth elevated"
            );
        }
    }

    /// Undo an enqueue whose send failed (mailbox closed).
    pub fn record_abandoned(&self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a message being removed from the mailbox (processed).
    pub fn record_dequeue(&self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current mailbox depth.
    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Get the peak mailbox depth.
    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    /// Get total messages processed.
    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    /// Get the current mailbox level.
    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        level_for_depth(self.current_depth())
    }
}

fn level_for_depth(depth: usize) -> MailboxLevel {
    if depth > CONTROLLER_MAILBOX_WARNING {
        MailboxLevel::Critical
    } else if depth > CONTROLLER_MAILBOX_NORMAL {
        MailboxLevel::Warning
    } else {
        MailboxLevel::Normal
    }
}

/// Aggregated counters for the controller actor.
#[derive(Debug, Default)]
pub struct ActorMetrics {
    /// Bridges created by the controller.
    pub bridges_created: AtomicU64,
    /// Bridges the controller asked the engine to destroy.
    pub bridges_destroyed: AtomicU64,
    /// Pre-existing bridges taken under management.
    pub bridges_adopted: AtomicU64,
    /// Channels added to a bridge.
    pub admissions: AtomicU64,
    /// Admissions that left the channel unbridged.
    pub admission_failures: AtomicU64,
    /// Mailbox messages handled.
    pub messages_processed: AtomicU64,
    /// Bridge events handled (including ignored ones).
    pub events_processed: AtomicU64,
}

impl ActorMetrics {
    /// Create a new shared metrics instance.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn bridge_created(&self) {
        self.bridges_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bridge_destroyed(&self) {
        self.bridges_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bridge_adopted(&self) {
        self.bridges_adopted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn channel_admitted(&self) {
        self.admissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn admission_failed(&self) {
        self.admission_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_processed(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.bridges_created.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn destroyed_count(&self) -> u64 {
        self.bridges_destroyed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn adopted_count(&self) -> u64 {
        self.bridges_adopted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn admission_count(&self) -> u64 {
        self.admissions.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn admission_failure_count(&self) -> u64 {
        self.admission_failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_monitor_enqueue_dequeue() {
        let monitor = MailboxMonitor::new("bc-test");

        assert_eq!(monitor.current_depth(), 0);

        monitor.record_enqueue();
        assert_eq!(monitor.current_depth(), 1);
        assert_eq!(monitor.peak_depth(), 1);

        monitor.record_enqueue();
        monitor.record_enqueue();
        assert_eq!(monitor.current_depth(), 3);
        assert_eq!(monitor.peak_depth(), 3);

        monitor.record_dequeue();
        assert_eq!(monitor.current_depth(), 2);
        assert_eq!(monitor.peak_depth(), 3); // Peak stays at 3
        assert_eq!(monitor.messages_processed(), 1);
    }

    #[test]
    fn test_mailbox_monitor_abandoned_not_counted_as_processed() {
        let monitor = MailboxMonitor::new("bc-test");

        monitor.record_enqueue();
        monitor.record_abandoned();

        assert_eq!(monitor.current_depth(), 0);
        assert_eq!(monitor.messages_processed(), 0);
    }

    #[test]
    fn test_mailbox_monitor_levels() {
        let monitor = MailboxMonitor::new("bc-test");

        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        for _ in 0..150 {
            monitor.record_enqueue();
        }
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        for _ in 0..400 {
            monitor.record_enqueue();
        }
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }

    #[test]
    fn test_actor_metrics() {
        let metrics = ActorMetrics::new();

        metrics.bridge_created();
        metrics.bridge_adopted();
        metrics.channel_admitted();
        metrics.channel_admitted();
        metrics.admission_failed();
        metrics.bridge_destroyed();

        assert_eq!(metrics.created_count(), 1);
        assert_eq!(metrics.adopted_count(), 1);
        assert_eq!(metrics.admission_count(), 2);
        assert_eq!(metrics.admission_failure_count(), 1);
        assert_eq!(metrics.destroyed_count(), 1);
    }
}
