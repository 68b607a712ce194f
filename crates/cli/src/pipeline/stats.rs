//! Pipeline statistics.

use std::time::Duration;

use relay::RelayStats;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// What the relay wrote
    pub relay: RelayStats,

    /// Lines taken from the input
    pub lines_read: u64,

    /// Transient read failures that were retried
    pub transient_read_errors: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Lines read but never written (shutdown before the queue drained)
    pub fn lines_pending(&self) -> u64 {
        self.lines_read.saturating_sub(self.relay.lines)
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        eprintln!("\n=== Relay Statistics ===");
        eprintln!("  Duration: {:.2}s", self.duration.as_secs_f64());
        eprintln!("  Lines read: {}", self.lines_read);
        eprintln!("  Lines written: {}", self.relay.lines);
        eprintln!("  Bytes written: {}", self.relay.bytes);
        eprintln!("  Lines/s: {:.2}", self.relay.lines_per_sec());
        eprintln!(
            "  Rotations: {} ({})",
            self.relay.rotations, self.relay.tally
        );
        eprintln!("  Sink generation: {}", self.relay.generation);
        if self.transient_read_errors > 0 {
            eprintln!("  Transient read errors: {}", self.transient_read_errors);
        }
        if self.lines_pending() > 0 {
            eprintln!("  Lines not written: {}", self.lines_pending());
        }
    }
}
