//! # Ingestion
//!
//! Line source for the relay.
//!
//! Responsibilities:
//! - Split an input byte stream into lines (buffered or unbuffered)
//! - Classify read errors into transient (retried) and fatal (sequence ends)
//! - Pump lines from a dedicated reader thread into the relay's channel
//!
//! ## Usage Example
//!
//! ```no_run
//! use ingestion::{spawn_reader, LineSource, ReadMode, ReaderConfig};
//!
//! # async fn demo() -> std::io::Result<()> {
//! let source = LineSource::new(std::io::stdin(), ReaderConfig::default());
//! let (mut rx, _handle) = spawn_reader(source, ReadMode::Unbuffered, 1024)?;
//! while let Some(line) = rx.recv().await {
//!     println!("{}", line.unwrap());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod pipeline;
mod source;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot, ReaderConfig};
pub use error::{IngestionError, Result};
pub use pipeline::{spawn_reader, ReaderHandle};
pub use source::{LineSource, Lines, ReadMode};
