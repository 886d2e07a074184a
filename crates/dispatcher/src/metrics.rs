//! Engine metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single dispatch engine
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Current pending-record buffer depth
    buffer_depth: AtomicUsize,
    /// Total records appended to the buffer
    buffered_count: AtomicU64,
    /// Total records confirmed delivered and discarded
    delivered_count: AtomicU64,
    /// Total failed batch posts (batch retained each time)
    failure_count: AtomicU64,
    /// Total records dropped at the inbound queue (queue full)
    dropped_count: AtomicU64,
}

impl EngineMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current buffer depth
    pub fn buffer_depth(&self) -> usize {
        self.buffer_depth.load(Ordering::Relaxed)
    }

    /// Set current buffer depth
    pub fn set_buffer_depth(&self, depth: usize) {
        self.buffer_depth.store(depth, Ordering::Relaxed);
    }

    /// Get total buffered count
    pub fn buffered_count(&self) -> u64 {
        self.buffered_count.load(Ordering::Relaxed)
    }

    /// Increment buffered count
    pub fn inc_buffered(&self) {
        self.buffered_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total delivered count
    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    /// Add to delivered count
    pub fn add_delivered(&self, count: u64) {
        self.delivered_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get dropped count
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Increment dropped count
    pub fn inc_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buffer_depth: self.buffer_depth(),
            buffered_count: self.buffered_count(),
            delivered_count: self.delivered_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of engine metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub buffer_depth: usize,
    pub buffered_count: u64,
    pub delivered_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}
