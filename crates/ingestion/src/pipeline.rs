//! Reader thread - pumps lines into the relay channel

use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::IngestionMetrics;
use crate::error::IngestionError;
use crate::source::{LineSource, ReadMode};

/// Handle to a running reader thread
///
/// The thread is detached when the handle is dropped: a read blocked on a quiet
/// input must not keep the process alive.
pub struct ReaderHandle {
    thread: JoinHandle<()>,
    metrics: Arc<IngestionMetrics>,
}

impl ReaderHandle {
    /// Shared metrics
    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Whether the reader has stopped (EOF, error or receiver dropped)
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// Start reading `source` on a dedicated thread
///
/// Every line (or the terminating error) is forwarded through a bounded channel of
/// `capacity`; the thread blocks while the channel is full. The channel closes when the
/// input is exhausted.
///
/// # Errors
/// Returns error if the thread cannot be spawned
pub fn spawn_reader<R>(
    source: LineSource<R>,
    mode: ReadMode,
    capacity: usize,
) -> std::io::Result<(mpsc::Receiver<Result<String, IngestionError>>, ReaderHandle)>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let metrics = Arc::clone(source.metrics());

    let thread = std::thread::Builder::new()
        .name("rotator-reader".to_string())
        .spawn(move || {
            debug!(?mode, "Reader thread started");
            for item in source.lines(mode) {
                if tx.blocking_send(item).is_err() {
                    debug!("Relay dropped the line channel, stopping reader");
                    return;
                }
            }
            info!("Input exhausted, reader thread stopping");
        })?;

    Ok((rx, ReaderHandle { thread, metrics }))
}
