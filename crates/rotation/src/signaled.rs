//! Signaled policy - reopens on delivery of an OS signal
//!
//! The signal never touches the sink. tokio's signal driver records the delivery and
//! [`RotationPolicy::triggered`] resolves; the relay applies the reopen between writes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{
    ContractError, RotationEvent, RotationPolicy, RotationReason, SignalKind, SinkState,
};
use tokio::signal::unix::{self, Signal};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Programmatic rotation request, equivalent to delivering the signal
#[derive(Debug, Clone)]
pub struct RotationTrigger {
    notify: Arc<Notify>,
}

impl RotationTrigger {
    /// Request a rotation; requests made before the relay gets to it coalesce
    pub fn fire(&self) {
        self.notify.notify_one();
    }
}

/// Reopens the path with a fresh handle whenever the signal arrives
#[derive(Debug)]
pub struct SignaledPolicy {
    path: PathBuf,
    kind: SignalKind,
    signal: Signal,
    listening: bool,
    trigger: Arc<Notify>,
    generation: u64,
}

impl SignaledPolicy {
    /// Arm the policy for `kind`
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    /// Returns a configuration error if the signal handler cannot be installed
    pub fn new(path: impl Into<PathBuf>, kind: SignalKind) -> Result<Self, ContractError> {
        let signal = unix::signal(unix::SignalKind::from_raw(kind.raw())).map_err(|e| {
            ContractError::config_validation(
                "rotation.signal",
                format!("cannot handle {kind}: {e}"),
            )
        })?;

        let path = path.into();
        debug!(path = %path.display(), signal = %kind, "Signal handler armed");

        Ok(Self {
            path,
            kind,
            signal,
            listening: true,
            trigger: Arc::new(Notify::new()),
            generation: 0,
        })
    }

    /// Arm the policy from a signal name such as `"HUP"` or `"SIGUSR1"`
    ///
    /// # Errors
    /// Returns `UnknownSignal` for names outside the signal table
    pub fn from_name(path: impl Into<PathBuf>, name: &str) -> Result<Self, ContractError> {
        let kind: SignalKind = name.parse()?;
        Self::new(path, kind)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn signal(&self) -> SignalKind {
        self.kind
    }

    /// Handle for requesting a rotation without the OS signal
    pub fn trigger(&self) -> RotationTrigger {
        RotationTrigger {
            notify: Arc::clone(&self.trigger),
        }
    }
}

impl RotationPolicy for SignaledPolicy {
    fn name(&self) -> &'static str {
        "signaled"
    }

    fn on_opened(&mut self, state: &SinkState) {
        if state.generation > self.generation {
            info!(
                path = %self.path.display(),
                signal = %self.kind,
                generation = state.generation,
                "Reopened after signal"
            );
        }
        self.generation = state.generation;
    }

    fn check_before(&mut self) -> Result<Option<RotationEvent>, ContractError> {
        Ok(None)
    }

    fn check_after(&mut self, _written: usize) -> Result<Option<RotationEvent>, ContractError> {
        Ok(None)
    }

    async fn triggered(&mut self) -> RotationEvent {
        loop {
            tokio::select! {
                received = self.signal.recv(), if self.listening => match received {
                    Some(()) => {
                        debug!(signal = %self.kind, "Rotation signal received");
                        return RotationEvent::new(
                            self.path.clone(),
                            RotationReason::Signal(self.kind),
                        );
                    }
                    None => {
                        warn!(signal = %self.kind, "Signal stream closed, only manual triggers remain");
                        self.listening = false;
                    }
                },
                () = self.trigger.notified() => {
                    return RotationEvent::new(self.path.clone(), RotationReason::Manual);
                }
            }
        }
    }
}
