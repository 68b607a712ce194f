//! File identity and sink state snapshots

use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stable identity of a file on disk (device + inode)
///
/// Two paths with equal identity refer to the same file, and a file recreated at the
/// same path gets a new identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    pub dev: u64,
    pub ino: u64,
}

impl FileIdentity {
    /// Identity from already fetched metadata
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    /// Identity of whatever currently lives at `path`
    ///
    /// Returns `Ok(None)` when nothing exists at the path.
    pub fn of_path(path: &Path) -> std::io::Result<Option<Self>> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(Self::from_metadata(&meta))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Snapshot of a sink's live handle
///
/// Handed to the rotation policy after the initial open and after every reopen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkState {
    /// Path the live handle was opened from
    pub target: PathBuf,
    /// 0 for the initial open, incremented on every reopen
    pub generation: u64,
    /// Identity of the live handle
    pub identity: FileIdentity,
    /// Current length of the file behind the live handle
    pub len: u64,
}
