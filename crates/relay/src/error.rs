//! Relay error types

use thiserror::Error;

/// Relay-specific errors
///
/// Every variant is fatal: the relay stops and the sink is closed.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Sink, policy or configuration error (from contract)
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),

    /// Input stream failed
    #[error("input error: {0}")]
    Source(#[from] ingestion::IngestionError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Whether the relay failed because of its configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Contract(e) if e.is_config())
    }
}
