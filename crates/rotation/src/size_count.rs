//! SizeCount policy - self rotation through numbered backups
//!
//! `path` → `path.1` → `path.2` … `path.<max_files>`; the oldest backup is discarded.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use contracts::{
    ByteSize, ContractError, RotationEvent, RotationPolicy, RotationReason, SinkState,
    DEFAULT_MAX_FILES,
};
use tracing::{debug, info, instrument};

/// SizeCount policy state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeState {
    /// Accumulating bytes into the current file
    Open,
    /// Backups shifted, waiting for the sink to open a fresh file
    Rotating,
}

/// Path of the `index`-th backup of `path` (`app.log` → `app.log.1`)
pub fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Rotates once `max_bytes` have been written since the last rotation
#[derive(Debug)]
pub struct SizeCountPolicy {
    path: PathBuf,
    max_bytes: Option<u64>,
    max_files: usize,
    bytes_written: u64,
    state: SizeState,
}

impl SizeCountPolicy {
    /// `max_bytes = None` never rotates; `Some(0)` rotates after every write.
    ///
    /// A `max_files` of 0 falls back to [`DEFAULT_MAX_FILES`]: the current file is
    /// always kept as `path.1`.
    pub fn new(path: impl Into<PathBuf>, max_bytes: Option<ByteSize>, max_files: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes: max_bytes.map(ByteSize::bytes),
            max_files: if max_files == 0 {
                DEFAULT_MAX_FILES
            } else {
                max_files
            },
            bytes_written: 0,
            state: SizeState::Open,
        }
    }

    /// Build from a human size string and an optional backup count
    ///
    /// # Errors
    /// Returns `InvalidSize` if `size` does not match the size grammar
    pub fn from_strings(
        path: impl Into<PathBuf>,
        size: Option<&str>,
        count: Option<usize>,
    ) -> Result<Self, ContractError> {
        let max_bytes = size.map(str::parse).transpose()?;
        Ok(Self::new(
            path,
            max_bytes,
            count.unwrap_or(DEFAULT_MAX_FILES),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Bytes in the current file since it was opened
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn state(&self) -> SizeState {
        self.state
    }

    /// Shift the backup chain and move the current file to `path.1`
    #[instrument(
        name = "size_count_shift_backups",
        skip(self),
        fields(path = %self.path.display(), max_files = self.max_files)
    )]
    fn shift_backups(&self) -> Result<(), ContractError> {
        remove_if_exists(&backup_path(&self.path, self.max_files))?;
        for index in (1..self.max_files).rev() {
            rename_if_exists(
                &backup_path(&self.path, index),
                &backup_path(&self.path, index + 1),
            )?;
        }
        rename_if_exists(&self.path, &backup_path(&self.path, 1))
    }
}

fn remove_if_exists(path: &Path) -> Result<(), ContractError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Discarded oldest backup");
            metrics::counter!("rotator_backups_discarded_total").increment(1);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ContractError::rotate(path, e)),
    }
}

fn rename_if_exists(from: &Path, to: &Path) -> Result<(), ContractError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ContractError::rotate(from, e)),
    }
}

impl RotationPolicy for SizeCountPolicy {
    fn name(&self) -> &'static str {
        "sizecount"
    }

    fn on_opened(&mut self, state: &SinkState) {
        self.bytes_written = state.len;
        self.state = SizeState::Open;
    }

    fn check_before(&mut self) -> Result<Option<RotationEvent>, ContractError> {
        Ok(None)
    }

    fn check_after(&mut self, written: usize) -> Result<Option<RotationEvent>, ContractError> {
        self.bytes_written += written as u64;

        let Some(max_bytes) = self.max_bytes else {
            return Ok(None);
        };
        if self.bytes_written < max_bytes {
            return Ok(None);
        }

        info!(
            path = %self.path.display(),
            bytes_written = self.bytes_written,
            max_bytes,
            "Size limit reached, rotating"
        );
        self.state = SizeState::Rotating;
        self.shift_backups()?;

        Ok(Some(RotationEvent::new(
            self.path.clone(),
            RotationReason::SizeExceeded,
        )))
    }

    async fn triggered(&mut self) -> RotationEvent {
        std::future::pending().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FileIdentity;
    use tempfile::tempdir;

    /// Simulate the sink reopening a fresh file at `path`
    fn reopen(policy: &mut SizeCountPolicy, path: &Path, generation: u64) {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        policy.on_opened(&SinkState {
            target: path.to_path_buf(),
            generation,
            identity: FileIdentity::of_path(path).unwrap().unwrap(),
            len: fs::metadata(path).unwrap().len(),
        });
    }

    fn write(policy: &mut SizeCountPolicy, path: &Path, line: &str) -> Option<RotationEvent> {
        let mut content = fs::read_to_string(path).unwrap_or_default();
        content.push_str(line);
        content.push('\n');
        fs::write(path, content).unwrap();
        policy.check_after(line.len() + 1).unwrap()
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/var/log/app.log"), 3),
            PathBuf::from("/var/log/app.log.3")
        );
    }

    #[test]
    fn test_from_strings() {
        let policy = SizeCountPolicy::from_strings("a.log", Some(" 1 MB "), None).unwrap();
        assert_eq!(policy.max_bytes(), Some(1024 * 1024));
        assert_eq!(policy.max_files(), 5);

        let policy = SizeCountPolicy::from_strings("a.log", None, Some(0)).unwrap();
        assert_eq!(policy.max_files(), 5);

        let err = SizeCountPolicy::from_strings("a.log", Some("10294 TB"), None).unwrap_err();
        assert!(matches!(err, ContractError::InvalidSize { .. }));
    }

    #[test]
    fn test_single_rotation_when_limit_crossed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let mut policy = SizeCountPolicy::new(&path, Some(ByteSize(20)), 3);
        reopen(&mut policy, &path, 0);

        // 6 bytes per line: rotation on the 4th line (24 >= 20).
        assert!(write(&mut policy, &path, "aaaaa").is_none());
        assert!(write(&mut policy, &path, "bbbbb").is_none());
        assert!(write(&mut policy, &path, "ccccc").is_none());
        let event = write(&mut policy, &path, "ddddd").unwrap();

        assert_eq!(event.reason, RotationReason::SizeExceeded);
        assert_eq!(event.target, path);
        assert_eq!(policy.state(), SizeState::Rotating);
        assert!(!path.exists());
        assert_eq!(
            fs::read_to_string(backup_path(&path, 1)).unwrap(),
            "aaaaa\nbbbbb\nccccc\nddddd\n"
        );
        assert!(!backup_path(&path, 2).exists());

        reopen(&mut policy, &path, 1);
        assert_eq!(policy.state(), SizeState::Open);
        assert_eq!(policy.bytes_written(), 0);
        assert!(write(&mut policy, &path, "eeeee").is_none());
    }

    #[test]
    fn test_oldest_backup_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let mut policy = SizeCountPolicy::new(&path, Some(ByteSize(1)), 2);
        reopen(&mut policy, &path, 0);

        for (generation, line) in ["one", "two", "three"].into_iter().enumerate() {
            assert!(write(&mut policy, &path, line).is_some());
            reopen(&mut policy, &path, generation as u64 + 1);
        }

        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "three\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "two\n");
        assert!(!backup_path(&path, 3).exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_no_size_never_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let mut policy = SizeCountPolicy::new(&path, None, 5);
        reopen(&mut policy, &path, 0);

        for _ in 0..100 {
            assert!(write(&mut policy, &path, "xxxxxxxxxx").is_none());
        }
        assert_eq!(policy.bytes_written(), 1100);
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn test_zero_size_rotates_every_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let mut policy = SizeCountPolicy::new(&path, Some(ByteSize(0)), 5);
        reopen(&mut policy, &path, 0);

        assert!(write(&mut policy, &path, "a").is_some());
        reopen(&mut policy, &path, 1);
        assert!(write(&mut policy, &path, "b").is_some());
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "b\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "a\n");
    }

    #[test]
    fn test_zero_count_keeps_every_written_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let mut policy = SizeCountPolicy::new(&path, Some(ByteSize(4)), 0);
        assert_eq!(policy.max_files(), DEFAULT_MAX_FILES);
        reopen(&mut policy, &path, 0);

        assert!(write(&mut policy, &path, "aaaa").is_some());
        reopen(&mut policy, &path, 1);
        assert!(write(&mut policy, &path, "bbbb").is_some());
        reopen(&mut policy, &path, 2);
        assert!(write(&mut policy, &path, "cc").is_none());

        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "aaaa\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "bbbb\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "cc\n");
    }

    #[test]
    fn test_existing_length_counts_toward_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        fs::write(&path, "0123456789\n").unwrap();

        let mut policy = SizeCountPolicy::new(&path, Some(ByteSize(12)), 5);
        reopen(&mut policy, &path, 0);
        assert_eq!(policy.bytes_written(), 11);
        assert!(write(&mut policy, &path, "x").is_some());
    }
}
