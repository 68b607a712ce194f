//! Error types for CLI operations.

use contracts::ContractError;
use relay::RelayError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(ContractError),

    /// Relay stopped on a fatal error
    #[error("Relay failed: {0}")]
    Relay(RelayError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config(ContractError::config_validation(field, message))
    }

    /// Process exit code: 2 for configuration errors, 1 for everything else
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Relay(e) if e.is_config() => 2,
            _ => 1,
        }
    }
}

impl From<ContractError> for CliError {
    fn from(e: ContractError) -> Self {
        if e.is_config() {
            Self::Config(e)
        } else {
            Self::Relay(RelayError::Contract(e))
        }
    }
}

impl From<RelayError> for CliError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::Contract(inner) if inner.is_config() => Self::Config(inner),
            other => Self::Relay(other),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
