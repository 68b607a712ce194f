//! Reader configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Reader configuration
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Consecutive transient failures tolerated before the sequence fails
    pub max_consecutive_failures: u32,

    /// Pause between retries of a transient failure
    pub retry_backoff: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 16,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

impl ReaderConfig {
    /// Create new reader configuration
    pub fn new(max_consecutive_failures: u32, retry_backoff: Duration) -> Self {
        Self {
            max_consecutive_failures,
            retry_backoff,
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total lines yielded
    pub lines_read: AtomicU64,

    /// Total bytes consumed, terminators included
    pub bytes_read: AtomicU64,

    /// Transient read failures that were retried
    pub transient_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a yielded line of `bytes` raw bytes
    pub fn record_line(&self, bytes: usize) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record transient error
    pub fn record_transient_error(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total lines yielded
    pub lines_read: u64,

    /// Total bytes consumed
    pub bytes_read: u64,

    /// Transient read failures
    pub transient_errors: u64,
}
