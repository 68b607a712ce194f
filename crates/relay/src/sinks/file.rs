//! FileSink - appends lines to a file that can be swapped at runtime

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, FileIdentity, LineSink, OpenMode, RelayConfig, SinkState};
use tracing::{debug, error, info, instrument, warn};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file path
    pub path: PathBuf,
    /// Mode of the initial open
    pub open_mode: OpenMode,
    /// Retries of a transient write failure
    pub max_write_retries: u32,
    /// `fsync` retired handles
    pub fsync_on_rotate: bool,
}

impl FileSinkConfig {
    /// Append to `path` with default retry settings
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open_mode: OpenMode::Append,
            max_write_retries: 3,
            fsync_on_rotate: false,
        }
    }

    /// Create config from the relay configuration
    pub fn from_relay_config(config: &RelayConfig) -> Self {
        Self {
            path: config.path.clone(),
            open_mode: config.open_mode,
            max_write_retries: config.max_write_retries,
            fsync_on_rotate: config.fsync_on_rotate,
        }
    }
}

/// Sink that owns exactly one open file
#[derive(Debug)]
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    file: File,
    target: PathBuf,
    generation: u64,
    identity: FileIdentity,
    len: u64,
    closed: bool,
}

impl FileSink {
    /// Open the configured path
    ///
    /// # Errors
    /// Returns `SinkOpen` if the file cannot be opened or created
    #[instrument(name = "file_sink_open", skip(name, config), fields(path = %config.path.display()))]
    pub fn open(name: impl Into<String>, config: FileSinkConfig) -> Result<Self, ContractError> {
        let name = name.into();
        let (file, identity, len) = open_target(&name, &config.path, config.open_mode)?;
        info!(sink = %name, path = %config.path.display(), mode = ?config.open_mode, "FileSink opened");

        Ok(Self {
            target: config.path.clone(),
            name,
            config,
            file,
            generation: 0,
            identity,
            len,
            closed: false,
        })
    }

    /// Current target path
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Generation of the live handle
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Flush and close a handle that is no longer used for writes
    fn retire(&self, mut old: File) {
        if let Err(e) = old.flush() {
            warn!(sink = %self.name, error = %e, "Flush of retired handle failed");
        }
        if self.config.fsync_on_rotate {
            if let Err(e) = old.sync_data() {
                warn!(sink = %self.name, error = %e, "Sync of retired handle failed");
            }
        }
        drop(old);
    }
}

/// Write all of `record`, retrying `WouldBlock`/`TimedOut` up to `max_retries` times.
///
/// Short writes are continued from where they stopped; `Interrupted` is retried
/// without counting against the limit.
fn write_all_retrying<W: Write>(
    writer: &mut W,
    record: &[u8],
    max_retries: u32,
    sink_name: &str,
) -> Result<(), ContractError> {
    let mut written = 0;
    let mut retries = 0;

    while written < record.len() {
        match writer.write(&record[written..]) {
            Ok(0) => {
                return Err(ContractError::sink_write(
                    sink_name,
                    "write returned zero bytes",
                ));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
                    && retries < max_retries =>
            {
                retries += 1;
                warn!(
                    sink = %sink_name,
                    error = %e,
                    attempt = retries,
                    max = max_retries,
                    "Transient write error, retrying"
                );
            }
            Err(e) => {
                error!(sink = %sink_name, error = %e, written, "Write failed");
                return Err(ContractError::sink_write(sink_name, e.to_string()));
            }
        }
    }
    Ok(())
}

/// Open `path`, creating parent directories, and identify the opened file
fn open_target(
    name: &str,
    path: &Path,
    mode: OpenMode,
) -> Result<(File, FileIdentity, u64), ContractError> {
    let open = || -> std::io::Result<(File, FileIdentity, u64)> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Append => options.append(true),
            OpenMode::Truncate => options.write(true).truncate(true),
        };

        let file = options.open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(std::io::Error::other("target is not a regular file"));
        }
        Ok((file, FileIdentity::from_metadata(&meta), meta.len()))
    };

    open().map_err(|e| ContractError::sink_open(name, path, e))
}

impl LineSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SinkState {
        SinkState {
            target: self.target.clone(),
            generation: self.generation,
            identity: self.identity,
            len: self.len,
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<usize, ContractError> {
        if self.closed {
            return Err(ContractError::sink_write(&self.name, "sink is closed"));
        }

        let mut record = Vec::with_capacity(line.len() + 1);
        record.extend_from_slice(line.as_bytes());
        record.push(b'\n');

        write_all_retrying(
            &mut self.file,
            &record,
            self.config.max_write_retries,
            &self.name,
        )?;
        self.len += record.len() as u64;
        Ok(record.len())
    }

    #[instrument(
        name = "file_sink_reopen",
        skip(self, target),
        fields(sink = %self.name, target = %target.display(), generation = self.generation)
    )]
    async fn reopen(&mut self, target: &Path) -> Result<(), ContractError> {
        // New handle first; on failure the old one stays live.
        let (file, identity, len) = open_target(&self.name, target, OpenMode::Append)?;

        let old = std::mem::replace(&mut self.file, file);
        self.target = target.to_path_buf();
        self.generation += 1;
        self.identity = identity;
        self.len = len;
        self.closed = false;

        self.retire(old);
        debug!(sink = %self.name, generation = self.generation, "Handle swapped");
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.file.flush()?;
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.closed {
            return Ok(());
        }
        self.file.flush()?;
        if self.config.fsync_on_rotate {
            self.file.sync_data()?;
        }
        self.closed = true;
        debug!(sink = %self.name, generation = self.generation, "FileSink closed");
        Ok(())
    }
}
