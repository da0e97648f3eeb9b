//! Monitor counters
//!
//! - Counters only, monotonic
//! - Reset only when a monitor is created
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by the ingestion loop and all watchers
///
/// Relaxed ordering throughout; readers only need eventually consistent
/// totals.
#[derive(Debug, Default)]
pub struct MonitorMetrics {
    events_received: AtomicU64,
    events_ignored: AtomicU64,
    watches_scheduled: AtomicU64,
    watches_coalesced: AtomicU64,
    quorumless_skips: AtomicU64,
    quorum_query_failures: AtomicU64,
    notifications: AtomicU64,
    settled: AtomicU64,
    removals: AtomicU64,
    cancellations: AtomicU64,
    backend_failures: AtomicU64,
}

impl MonitorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_events_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Event with may_promote == false
    pub fn increment_events_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_watches_scheduled(&self) {
        self.watches_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_watches_coalesced(&self) {
        self.watches_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_quorumless_skips(&self) {
        self.quorumless_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_quorum_query_failures(&self) {
        self.quorum_query_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_notifications(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_settled(&self) {
        self.settled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_removals(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cancellations(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_backend_failures(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            watches_scheduled: self.watches_scheduled.load(Ordering::Relaxed),
            watches_coalesced: self.watches_coalesced.load(Ordering::Relaxed),
            quorumless_skips: self.quorumless_skips.load(Ordering::Relaxed),
            quorum_query_failures: self.quorum_query_failures.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
            settled: self.settled.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
        }
    }

    /// Snapshot encoded as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub events_ignored: u64,
    pub watches_scheduled: u64,
    pub watches_coalesced: u64,
    pub quorumless_skips: u64,
    pub quorum_query_failures: u64,
    pub notifications: u64,
    pub settled: u64,
    pub removals: u64,
    pub cancellations: u64,
    pub backend_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        assert_eq!(MonitorMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let metrics = MonitorMetrics::new();

        metrics.increment_events_received();
        metrics.increment_events_received();
        metrics.increment_events_ignored();
        metrics.increment_watches_scheduled();
        metrics.increment_watches_coalesced();
        metrics.increment_quorumless_skips();
        metrics.increment_quorum_query_failures();
        metrics.increment_notifications();
        metrics.increment_settled();
        metrics.increment_removals();
        metrics.increment_cancellations();
        metrics.increment_backend_failures();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_received, 2);
        assert_eq!(snapshot.events_ignored, 1);
        assert_eq!(snapshot.watches_scheduled, 1);
        assert_eq!(snapshot.watches_coalesced, 1);
        assert_eq!(snapshot.quorumless_skips, 1);
        assert_eq!(snapshot.quorum_query_failures, 1);
        assert_eq!(snapshot.notifications, 1);
        assert_eq!(snapshot.settled, 1);
        assert_eq!(snapshot.removals, 1);
        assert_eq!(snapshot.cancellations, 1);
        assert_eq!(snapshot.backend_failures, 1);
    }

    #[test]
    fn test_to_json() {
        let metrics = MonitorMetrics::new();
        metrics.increment_notifications();

        let parsed: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(parsed["notifications"], 1);
        assert_eq!(parsed["removals"], 0);
    }

    #[test]
    fn test_concurrent_increments() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(MonitorMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.increment_events_received();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().events_received, 4000);
    }
}
