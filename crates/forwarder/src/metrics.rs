//! Sender metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one sender
#[derive(Debug, Default)]
pub struct SenderMetrics {
    /// Batches delivered successfully
    batch_count: AtomicU64,
    /// Batches that failed
    failure_count: AtomicU64,
    /// Records delivered successfully
    record_count: AtomicU64,
}

impl SenderMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get delivered batch count
    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    /// Get failed batch count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Get delivered record count
    pub fn record_count(&self) -> u64 {
        self.record_count.load(Ordering::Relaxed)
    }

    /// Record a delivered batch
    pub fn record_success(&self, records: usize) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        self.record_count
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Record a failed batch
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batch_count: self.batch_count(),
            failure_count: self.failure_count(),
            record_count: self.record_count(),
        }
    }
}

/// Snapshot of sender metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batch_count: u64,
    pub failure_count: u64,
    pub record_count: u64,
}
