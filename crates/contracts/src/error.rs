//! Layered error definitions
//!
//! Categorized by source: config / sink / io

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Human size string does not match the size grammar
    #[error("invalid size '{input}': expected <integer> [kb|mb|gb]")]
    InvalidSize { input: String },

    /// Signal name not present in the signal table
    #[error("no such signal '{name}'")]
    UnknownSignal { name: String },

    // ===== Sink Errors =====
    /// Sink target could not be opened
    #[error("sink '{sink_name}' failed to open {}: {source}", path.display())]
    SinkOpen {
        sink_name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Rotation could not move files through the backup chain
    #[error("rotation of {} failed: {source}", path.display())]
    Rotate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid size error
    pub fn invalid_size(input: impl Into<String>) -> Self {
        Self::InvalidSize {
            input: input.into(),
        }
    }

    /// Create unknown signal error
    pub fn unknown_signal(name: impl Into<String>) -> Self {
        Self::UnknownSignal { name: name.into() }
    }

    /// Create sink open error
    pub fn sink_open(
        sink_name: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::SinkOpen {
            sink_name: sink_name.into(),
            path: path.into(),
            source,
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create rotation error
    pub fn rotate(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Rotate {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a configuration error (reported before the relay starts)
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. }
                | Self::ConfigValidation { .. }
                | Self::InvalidSize { .. }
                | Self::UnknownSignal { .. }
        )
    }
}
