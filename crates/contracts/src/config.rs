//! RelayConfig - Config Loader output
//!
//! Describes one relay: output target, reader mode and rotation strategy.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ByteSize, ContractError, SignalKind};

/// Backups kept by size based rotation when no count is configured
pub const DEFAULT_MAX_FILES: usize = 5;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Output file path
    pub path: PathBuf,

    /// How the initial open treats an existing file
    #[serde(default)]
    pub open_mode: OpenMode,

    /// Read input through a read-ahead buffer
    #[serde(default)]
    pub buffered: bool,

    /// Lines queued between the reader thread and the relay
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Consecutive transient read failures tolerated before giving up
    #[serde(default = "default_max_read_failures")]
    pub max_consecutive_read_failures: u32,

    /// Retries of a transient write failure before giving up
    #[serde(default = "default_max_write_retries")]
    pub max_write_retries: u32,

    /// `fsync` a retired handle before closing it
    #[serde(default)]
    pub fsync_on_rotate: bool,

    /// Rotation strategy
    #[serde(default)]
    pub rotation: RotationConfig,
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_max_read_failures() -> u32 {
    16
}

fn default_max_write_retries() -> u32 {
    3
}

impl RelayConfig {
    /// Configuration with defaults for everything but the path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            version: ConfigVersion::default(),
            path: path.into(),
            open_mode: OpenMode::default(),
            buffered: false,
            channel_capacity: default_channel_capacity(),
            max_consecutive_read_failures: default_max_read_failures(),
            max_write_retries: default_max_write_retries(),
            fsync_on_rotate: false,
            rotation: RotationConfig::default(),
        }
    }

    /// Replace the rotation strategy
    pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Open mode for the initial open of the output file
///
/// Reopens after a rotation always append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Keep existing content
    #[default]
    Append,
    /// Discard existing content
    Truncate,
}

/// Rotation strategy as written in configuration
///
/// Values stay raw strings here; [`RotationConfig::resolve`] turns them into a
/// [`RotationSpec`] and reports malformed input as configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RotationConfig {
    /// React to the file being renamed or removed by a third party
    #[default]
    Watched,
    /// Reopen when a signal is delivered
    Signaled {
        #[serde(default = "default_signal")]
        signal: String,
    },
    /// Rotate through numbered backups once a size is reached
    #[serde(rename = "sizecount")]
    SizeCount {
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },
}

fn default_signal() -> String {
    "HUP".to_string()
}

impl RotationConfig {
    /// Strategy kind
    pub fn mode(&self) -> RotationMode {
        match self {
            Self::Watched => RotationMode::Watched,
            Self::Signaled { .. } => RotationMode::Signaled,
            Self::SizeCount { .. } => RotationMode::SizeCount,
        }
    }

    /// Parse and validate raw values
    ///
    /// # Errors
    /// - `UnknownSignal` for a name outside the signal table
    /// - `InvalidSize` for a size string outside the size grammar
    ///
    /// A `count` of 0 means the default backup count.
    pub fn resolve(&self) -> Result<RotationSpec, ContractError> {
        match self {
            Self::Watched => Ok(RotationSpec::Watched),
            Self::Signaled { signal } => Ok(RotationSpec::Signaled {
                signal: signal.parse()?,
            }),
            Self::SizeCount { size, count } => Ok(RotationSpec::SizeCount {
                max_bytes: size.as_deref().map(str::parse).transpose()?,
                max_files: count.filter(|&c| c > 0).unwrap_or(DEFAULT_MAX_FILES),
            }),
        }
    }
}

/// Rotation strategy kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationMode {
    Watched,
    Signaled,
    SizeCount,
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Watched => "watched",
            Self::Signaled => "signaled",
            Self::SizeCount => "sizecount",
        })
    }
}

/// Validated rotation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSpec {
    Watched,
    Signaled {
        signal: SignalKind,
    },
    SizeCount {
        /// `None` when no size was configured: never rotate by size
        max_bytes: Option<ByteSize>,
        max_files: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let config: RelayConfig = serde_json::from_str(r#"{ "path": "out.log" }"#).unwrap();
        assert_eq!(config.open_mode, OpenMode::Append);
        assert_eq!(config.rotation, RotationConfig::Watched);
        assert_eq!(config.channel_capacity, 1024);
        assert!(!config.buffered);
    }

    #[test]
    fn test_rotation_tagged_by_mode() {
        let config: RelayConfig = serde_json::from_str(
            r#"{ "path": "out.log", "rotation": { "mode": "sizecount", "size": "1 MB" } }"#,
        )
        .unwrap();
        assert_eq!(
            config.rotation.resolve().unwrap(),
            RotationSpec::SizeCount {
                max_bytes: Some(ByteSize(1024 * 1024)),
                max_files: DEFAULT_MAX_FILES,
            }
        );

        let config: RelayConfig =
            serde_json::from_str(r#"{ "path": "out.log", "rotation": { "mode": "signaled" } }"#)
                .unwrap();
        assert_eq!(
            config.rotation.resolve().unwrap(),
            RotationSpec::Signaled {
                signal: SignalKind::Hup
            }
        );
    }

    #[test]
    fn test_no_size_differs_from_zero_size() {
        let unset = RotationConfig::SizeCount {
            size: None,
            count: None,
        };
        let zero = RotationConfig::SizeCount {
            size: Some("0".into()),
            count: Some(2),
        };
        assert!(matches!(
            unset.resolve().unwrap(),
            RotationSpec::SizeCount { max_bytes: None, max_files: 5 }
        ));
        assert!(matches!(
            zero.resolve().unwrap(),
            RotationSpec::SizeCount { max_bytes: Some(ByteSize(0)), max_files: 2 }
        ));
    }

    #[test]
    fn test_zero_count_means_default() {
        let config = RotationConfig::SizeCount {
            size: Some("4".into()),
            count: Some(0),
        };
        assert_eq!(
            config.resolve().unwrap(),
            RotationSpec::SizeCount {
                max_bytes: Some(ByteSize(4)),
                max_files: DEFAULT_MAX_FILES,
            }
        );
    }

    #[test]
    fn test_resolve_reports_config_errors() {
        let bad_signal = RotationConfig::Signaled {
            signal: "JSLFJKSFJ".into(),
        };
        assert!(matches!(
            bad_signal.resolve(),
            Err(ContractError::UnknownSignal { .. })
        ));

        let bad_size = RotationConfig::SizeCount {
            size: Some("10294 TB".into()),
            count: None,
        };
        assert!(matches!(
            bad_size.resolve(),
            Err(ContractError::InvalidSize { .. })
        ));
    }
}
