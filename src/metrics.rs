//! Event Metrics Module
//!
//! Counters updated by the publisher and subscriber tasks. Dropped messages
//! and entries are recorded here so they stay observable after being logged.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Map Metrics ==
#[derive(Debug, Default)]
pub struct MapMetrics {
    events_published: AtomicU64,
    publish_failures: AtomicU64,
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    entries_skipped: AtomicU64,
}

impl MapMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a whole message discarded as undecodable.
    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts single entries left out of a batch.
    pub fn record_skipped(&self, count: usize) {
        if count > 0 {
            self.entries_skipped.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            entries_skipped: self.entries_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`MapMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Events handed to the shared store's publish
    pub events_published: u64,
    /// Events the shared store failed to publish
    pub publish_failures: u64,
    /// Messages received on the map channel
    pub messages_received: u64,
    /// Received messages discarded as malformed
    pub messages_dropped: u64,
    /// Entries dropped from batches on either side
    pub entries_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_snapshot() {
        let metrics = MapMetrics::new();
        metrics.record_published();
        metrics.record_received();
        metrics.record_received();
        metrics.record_dropped();
        metrics.record_skipped(3);
        metrics.record_skipped(0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_published, 1);
        assert_eq!(snapshot.messages_received, 2);
        assert_eq!(snapshot.messages_dropped, 1);
        assert_eq!(snapshot.entries_skipped, 3);
        assert_eq!(snapshot.publish_failures, 0);
    }
}
