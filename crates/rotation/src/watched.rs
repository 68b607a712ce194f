//! Watched policy - reacts to third parties renaming or removing the file

use std::path::{Path, PathBuf};

use contracts::{
    ContractError, FileIdentity, RotationEvent, RotationPolicy, RotationReason, SinkState,
};
use tracing::{debug, info};

/// Watched policy state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// The path still refers to the file the sink holds
    Stable,
    /// The path was renamed away, removed or recreated; a reopen is pending
    Detached,
}

/// Reopens the original path whenever its on-disk identity changes
///
/// Never renames or deletes anything itself.
#[derive(Debug)]
pub struct WatchedPolicy {
    path: PathBuf,
    last_known: Option<FileIdentity>,
    state: WatchState,
}

impl WatchedPolicy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_known: None,
            state: WatchState::Stable,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Identity of the file the sink currently holds
    pub fn last_known(&self) -> Option<FileIdentity> {
        self.last_known
    }
}

impl RotationPolicy for WatchedPolicy {
    fn name(&self) -> &'static str {
        "watched"
    }

    fn on_opened(&mut self, state: &SinkState) {
        self.last_known = Some(state.identity);
        if self.state == WatchState::Detached {
            info!(
                path = %self.path.display(),
                generation = state.generation,
                "Watched file reattached"
            );
        }
        self.state = WatchState::Stable;
    }

    fn check_before(&mut self) -> Result<Option<RotationEvent>, ContractError> {
        let current = FileIdentity::of_path(&self.path)?;
        if current.is_some() && current == self.last_known {
            return Ok(None);
        }

        debug!(
            path = %self.path.display(),
            known = ?self.last_known,
            current = ?current,
            "Watched file identity changed"
        );
        self.state = WatchState::Detached;
        Ok(Some(RotationEvent::new(
            self.path.clone(),
            RotationReason::Detached,
        )))
    }

    fn check_after(&mut self, _written: usize) -> Result<Option<RotationEvent>, ContractError> {
        Ok(None)
    }

    async fn triggered(&mut self) -> RotationEvent {
        std::future::pending().await
    }
}
