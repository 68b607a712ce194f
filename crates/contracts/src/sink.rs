//! LineSink trait - relay output interface
//!
//! Defines the abstract interface for swappable output sinks.

use std::path::Path;

use crate::{ContractError, SinkState};

/// Line output trait
///
/// A sink owns exactly one live handle. `reopen` installs a new handle before the old
/// one is flushed and closed, so no write is ever directed at a retired handle.
/// Writes and reopens both take `&mut self` and are therefore never concurrent.
#[trait_variant::make(LineSink: Send)]
pub trait LocalLineSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Snapshot of the live handle
    fn state(&self) -> SinkState;

    /// Write one line, appending the line terminator
    ///
    /// Returns the number of bytes written, terminator included.
    ///
    /// # Errors
    /// Returns write error once transient failures are exhausted
    async fn write_line(&mut self, line: &str) -> Result<usize, ContractError>;

    /// Replace the live handle with a freshly opened one at `target`
    ///
    /// # Errors
    /// Returns open error if the new target cannot be opened; the old handle stays live.
    async fn reopen(&mut self, target: &Path) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
