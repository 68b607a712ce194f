//! Pipeline orchestrator - wires the reader thread to the relay.

use std::future::Future;
use std::io::Read;
use std::time::{Duration, Instant};

use contracts::RelayConfig;
use ingestion::{spawn_reader, LineSource, ReadMode, ReaderConfig};
use relay::create_relay;
use tracing::info;

use super::PipelineStats;
use crate::error::Result;

/// Pause between retries of a transient read failure
const READ_RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Main pipeline orchestrator
pub struct Pipeline {
    config: RelayConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Relay `input` into the configured file until EOF or `shutdown`
    ///
    /// The relay (policy and sink) is built before the reader starts, so configuration
    /// errors surface before any input is consumed.
    pub async fn run<R, F>(self, input: R, shutdown: F) -> Result<PipelineStats>
    where
        R: Read + Send + 'static,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let config = &self.config;

        let relay = create_relay(config)?;

        let reader_config =
            ReaderConfig::new(config.max_consecutive_read_failures, READ_RETRY_BACKOFF);
        let source = LineSource::new(input, reader_config);
        let mode = ReadMode::from_buffered(config.buffered);
        let (lines, reader) = spawn_reader(source, mode, config.channel_capacity)?;

        info!(
            path = %config.path.display(),
            ?mode,
            capacity = config.channel_capacity,
            "Pipeline started"
        );

        let relay_stats = relay.run_until(lines, shutdown).await?;
        let read = reader.metrics().snapshot();

        Ok(PipelineStats {
            relay: relay_stats,
            lines_read: read.lines_read,
            transient_read_errors: read.transient_errors,
            duration: start_time.elapsed(),
        })
    }
}
