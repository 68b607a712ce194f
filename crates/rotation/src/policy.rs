//! Policy - the configured rotation strategy

use std::path::Path;

use contracts::{
    ContractError, RotationConfig, RotationEvent, RotationMode, RotationPolicy, RotationSpec,
    SinkState,
};
use tracing::instrument;

use crate::signaled::{RotationTrigger, SignaledPolicy};
use crate::size_count::SizeCountPolicy;
use crate::watched::WatchedPolicy;

/// One of the three rotation strategies, selected by configuration
#[derive(Debug)]
pub enum Policy {
    Watched(WatchedPolicy),
    Signaled(SignaledPolicy),
    SizeCount(SizeCountPolicy),
}

impl Policy {
    /// Build the policy for `path` from raw configuration
    ///
    /// # Errors
    /// Returns a configuration error for an unknown signal or malformed size
    pub fn from_config(path: &Path, config: &RotationConfig) -> Result<Self, ContractError> {
        Self::from_spec(path, config.resolve()?)
    }

    /// Build the policy for `path` from a validated strategy
    ///
    /// # Errors
    /// Returns a configuration error if the signal handler cannot be installed
    #[instrument(name = "policy_from_spec", skip(path), fields(path = %path.display()))]
    pub fn from_spec(path: &Path, spec: RotationSpec) -> Result<Self, ContractError> {
        Ok(match spec {
            RotationSpec::Watched => Self::Watched(WatchedPolicy::new(path)),
            RotationSpec::Signaled { signal } => Self::Signaled(SignaledPolicy::new(path, signal)?),
            RotationSpec::SizeCount {
                max_bytes,
                max_files,
            } => Self::SizeCount(SizeCountPolicy::new(path, max_bytes, max_files)),
        })
    }

    pub fn mode(&self) -> RotationMode {
        match self {
            Self::Watched(_) => RotationMode::Watched,
            Self::Signaled(_) => RotationMode::Signaled,
            Self::SizeCount(_) => RotationMode::SizeCount,
        }
    }

    /// Programmatic trigger, available for the signaled strategy
    pub fn trigger(&self) -> Option<RotationTrigger> {
        match self {
            Self::Signaled(policy) => Some(policy.trigger()),
            _ => None,
        }
    }
}

impl RotationPolicy for Policy {
    fn name(&self) -> &'static str {
        match self {
            Self::Watched(p) => p.name(),
            Self::Signaled(p) => p.name(),
            Self::SizeCount(p) => p.name(),
        }
    }

    fn on_opened(&mut self, state: &SinkState) {
        match self {
            Self::Watched(p) => p.on_opened(state),
            Self::Signaled(p) => p.on_opened(state),
            Self::SizeCount(p) => p.on_opened(state),
        }
    }

    fn check_before(&mut self) -> Result<Option<RotationEvent>, ContractError> {
        match self {
            Self::Watched(p) => p.check_before(),
            Self::Signaled(p) => p.check_before(),
            Self::SizeCount(p) => p.check_before(),
        }
    }

    fn check_after(&mut self, written: usize) -> Result<Option<RotationEvent>, ContractError> {
        match self {
            Self::Watched(p) => p.check_after(written),
            Self::Signaled(p) => p.check_after(written),
            Self::SizeCount(p) => p.check_after(written),
        }
    }

    async fn triggered(&mut self) -> RotationEvent {
        match self {
            Self::Watched(p) => p.triggered().await,
            Self::Signaled(p) => p.triggered().await,
            Self::SizeCount(p) => p.triggered().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ByteSize, SignalKind};

    #[test]
    fn test_from_config_rejects_bad_values() {
        let path = Path::new("foo.out");

        let err = Policy::from_config(
            path,
            &RotationConfig::Signaled {
                signal: "JSLFJKSFJ".into(),
            },
        )
        .unwrap_err();
        assert!(err.is_config());

        let err = Policy::from_config(
            path,
            &RotationConfig::SizeCount {
                size: Some("0s98f".into()),
                count: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidSize { .. }));
    }

    #[test]
    fn test_from_spec_selects_variant() {
        let path = Path::new("foo.out");
        let policy = Policy::from_spec(path, RotationSpec::Watched).unwrap();
        assert_eq!(policy.mode(), RotationMode::Watched);
        assert_eq!(policy.name(), "watched");
        assert!(policy.trigger().is_none());

        let policy = Policy::from_spec(
            path,
            RotationSpec::SizeCount {
                max_bytes: Some(ByteSize(10)),
                max_files: 2,
            },
        )
        .unwrap();
        assert_eq!(policy.mode(), RotationMode::SizeCount);
    }

    #[tokio::test]
    async fn test_signaled_exposes_trigger() {
        let policy = Policy::from_spec(
            Path::new("foo.out"),
            RotationSpec::Signaled {
                signal: SignalKind::Winch,
            },
        )
        .unwrap();
        assert_eq!(policy.mode(), RotationMode::Signaled);
        assert!(policy.trigger().is_some());
    }
}
