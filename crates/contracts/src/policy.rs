//! RotationPolicy trait - decides when the sink reopens

use std::fmt;
use std::path::PathBuf;

use crate::{ContractError, SignalKind, SinkState};

/// Why a rotation was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationReason {
    /// The file at the target path is no longer the one the sink holds
    Detached,
    /// The configured OS signal was delivered
    Signal(SignalKind),
    /// Rotation requested programmatically
    Manual,
    /// Bytes written since the last rotation reached the limit
    SizeExceeded,
}

impl RotationReason {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Signal(_) => "signal",
            Self::Manual => "manual",
            Self::SizeExceeded => "size_exceeded",
        }
    }
}

impl fmt::Display for RotationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(kind) => write!(f, "signal {kind}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// "Reopen now" request produced by a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationEvent {
    /// Path the sink must reopen
    pub target: PathBuf,
    pub reason: RotationReason,
}

impl RotationEvent {
    pub fn new(target: impl Into<PathBuf>, reason: RotationReason) -> Self {
        Self {
            target: target.into(),
            reason,
        }
    }
}

/// Rotation strategy trait
///
/// The relay calls `check_before` ahead of every write, `check_after` once a write
/// succeeded, and concurrently awaits `triggered` for asynchronous stimuli. Every
/// returned event is applied with a sink reopen followed by `on_opened`.
#[trait_variant::make(RotationPolicy: Send)]
pub trait LocalRotationPolicy {
    /// Policy name (used for logging/metrics)
    fn name(&self) -> &'static str;

    /// Record the state of a freshly opened sink handle
    fn on_opened(&mut self, state: &SinkState);

    /// Inspect before a write
    ///
    /// # Errors
    /// Returns error if the policy cannot observe its trigger condition
    fn check_before(&mut self) -> Result<Option<RotationEvent>, ContractError>;

    /// Inspect after a write of `written` bytes
    ///
    /// # Errors
    /// Returns error if preparing the rotation failed
    fn check_after(&mut self, written: usize) -> Result<Option<RotationEvent>, ContractError>;

    /// Resolves when an asynchronous rotation stimulus arrives
    ///
    /// Must be cancel-safe; policies without asynchronous stimuli never resolve.
    async fn triggered(&mut self) -> RotationEvent;
}
