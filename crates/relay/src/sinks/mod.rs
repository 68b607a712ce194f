//! Sink implementations

mod file;

pub use self::file::{FileSink, FileSinkConfig};
