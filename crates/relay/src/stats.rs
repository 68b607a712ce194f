//! Relay statistics

use std::time::Duration;

use observability::RotationTally;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Lines written to the sink
    pub lines: u64,

    /// Bytes written to the sink
    pub bytes: u64,

    /// Reopens performed
    pub rotations: u64,

    /// Reopens grouped by policy and reason
    pub tally: RotationTally,

    /// Generation of the last sink handle
    pub generation: u64,

    /// Total duration of the run
    pub duration: Duration,
}

impl RelayStats {
    /// Lines per second throughput
    pub fn lines_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.lines as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}
