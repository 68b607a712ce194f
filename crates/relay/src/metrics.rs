//! Relay metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use observability::RotationTally;

/// In-process counters of one relay run
///
/// Every record call is mirrored to the `metrics` facade.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Lines written to the sink
    lines: AtomicU64,
    /// Bytes written to the sink, terminators included
    bytes: AtomicU64,
    /// Completed reopens
    rotations: AtomicU64,
    /// Rotations grouped by policy and reason
    tally: Mutex<RotationTally>,
}

impl RelayMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one written line of `bytes` bytes
    pub fn record_line(&self, bytes: usize) {
        self.lines.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        observability::record_line_relayed(bytes);
    }

    /// Record the generation of the handle the relay starts with
    pub fn record_opened(&self, generation: u64) {
        observability::record_sink_generation(generation);
    }

    /// Record a completed rotation
    pub fn record_rotation(&self, policy: &str, reason: &str, generation: u64) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
        self.tally
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(policy, reason);
        observability::record_rotation(policy, reason, generation);
    }

    pub fn lines(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Rotations grouped by policy and reason
    pub fn tally(&self) -> RotationTally {
        self.tally
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines: self.lines(),
            bytes: self.bytes(),
            rotations: self.rotations(),
        }
    }
}

/// Snapshot of relay metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines: u64,
    pub bytes: u64,
    pub rotations: u64,
}
