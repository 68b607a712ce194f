//! Relay - main loop moving lines from the input channel into the sink

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use contracts::{LineSink, RelayConfig, RotationEvent, RotationPolicy};
use ingestion::IngestionError;
use rotation::Policy;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::error::RelayError;
use crate::metrics::RelayMetrics;
use crate::sinks::{FileSink, FileSinkConfig};
use crate::stats::RelayStats;

/// Input side of the relay: lines produced by the reader thread
pub type LineReceiver = mpsc::Receiver<Result<String, IngestionError>>;

/// Owns one sink and one rotation policy; the only writer to the sink
pub struct Relay<S, P> {
    sink: S,
    policy: P,
    metrics: Arc<RelayMetrics>,
}

impl<S: LineSink, P: RotationPolicy> Relay<S, P> {
    /// Create a relay around an already opened sink
    pub fn new(sink: S, policy: P) -> Self {
        Self {
            sink,
            policy,
            metrics: Arc::new(RelayMetrics::new()),
        }
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Relay until the input channel closes
    ///
    /// # Errors
    /// Returns the first fatal sink, policy or input error
    pub async fn run(self, lines: LineReceiver) -> Result<RelayStats, RelayError> {
        self.run_until(lines, std::future::pending()).await
    }

    /// Relay until the input channel closes or `shutdown` resolves
    ///
    /// The sink is flushed and closed on every exit path.
    ///
    /// # Errors
    /// Returns the first fatal sink, policy or input error
    #[instrument(
        name = "relay_run",
        skip_all,
        fields(sink = %self.sink.name(), policy = self.policy.name())
    )]
    pub async fn run_until<F>(
        mut self,
        mut lines: LineReceiver,
        shutdown: F,
    ) -> Result<RelayStats, RelayError>
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        info!("Relay started");

        let opened = self.sink.state();
        self.policy.on_opened(&opened);
        self.metrics.record_opened(opened.generation);

        tokio::pin!(shutdown);
        let result = self.pump(&mut lines, shutdown).await;
        let closed = self.finish().await;

        if let Err(ref e) = result {
            error!(error = %e, "Relay aborted");
        }
        result?;
        closed?;

        let snapshot = self.metrics.snapshot();
        let stats = RelayStats {
            lines: snapshot.lines,
            bytes: snapshot.bytes,
            rotations: snapshot.rotations,
            tally: self.metrics.tally(),
            generation: self.sink.state().generation,
            duration: start.elapsed(),
        };
        info!(
            lines = stats.lines,
            bytes = stats.bytes,
            rotations = stats.rotations,
            "Relay finished"
        );
        Ok(stats)
    }

    async fn pump<F>(
        &mut self,
        lines: &mut LineReceiver,
        mut shutdown: Pin<&mut F>,
    ) -> Result<(), RelayError>
    where
        F: Future<Output = ()>,
    {
        loop {
            tokio::select! {
                biased;

                () = shutdown.as_mut() => {
                    info!("Shutdown requested, stopping relay");
                    return Ok(());
                }
                event = self.policy.triggered() => {
                    self.rotate(event).await?;
                }
                next = lines.recv() => match next {
                    Some(Ok(line)) => self.relay_line(&line).await?,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("Input closed, shutting down");
                        return Ok(());
                    }
                },
            }
        }
    }

    async fn relay_line(&mut self, line: &str) -> Result<(), RelayError> {
        if let Some(event) = self.policy.check_before()? {
            self.rotate(event).await?;
        }

        let written = self.sink.write_line(line).await?;
        self.metrics.record_line(written);

        if let Some(event) = self.policy.check_after(written)? {
            self.rotate(event).await?;
        }
        Ok(())
    }

    #[instrument(
        name = "relay_rotate",
        skip(self, event),
        fields(reason = %event.reason, target = %event.target.display())
    )]
    async fn rotate(&mut self, event: RotationEvent) -> Result<(), RelayError> {
        self.sink.reopen(&event.target).await?;

        let state = self.sink.state();
        self.policy.on_opened(&state);
        self.metrics
            .record_rotation(self.policy.name(), event.reason.as_str(), state.generation);

        info!(
            generation = state.generation,
            reason = %event.reason,
            "Sink rotated"
        );
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), RelayError> {
        let flushed = self.sink.flush().await;
        let closed = self.sink.close().await;
        debug!(sink = %self.sink.name(), "Sink released");
        flushed?;
        closed?;
        Ok(())
    }
}

/// Build the relay described by `config`: rotation policy first, then the sink
///
/// Configuration errors surface here, before the output file is touched.
/// Must be called within a tokio runtime when the strategy is signaled.
///
/// # Errors
/// Returns configuration errors and sink open errors
#[instrument(name = "relay_create", skip(config), fields(path = %config.path.display()))]
pub fn create_relay(config: &RelayConfig) -> Result<Relay<FileSink, Policy>, RelayError> {
    let policy = Policy::from_config(&config.path, &config.rotation)?;
    let sink = FileSink::open("file", FileSinkConfig::from_relay_config(config))?;
    debug!(mode = %policy.mode(), "Relay created");
    Ok(Relay::new(sink, policy))
}
