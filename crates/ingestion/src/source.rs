//! LineSource - lazy line iteration over an input stream

use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{IngestionMetrics, ReaderConfig};
use crate::error::IngestionError;

/// How the input stream is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Read ahead through a buffer
    Buffered,
    /// Read one byte at a time, never consuming past the current line
    #[default]
    Unbuffered,
}

impl ReadMode {
    pub fn from_buffered(buffered: bool) -> Self {
        if buffered {
            Self::Buffered
        } else {
            Self::Unbuffered
        }
    }
}

/// Input stream wrapper
///
/// Bound to one relay run: [`LineSource::lines`] consumes it.
pub struct LineSource<R> {
    reader: R,
    config: ReaderConfig,
    metrics: Arc<IngestionMetrics>,
}

impl<R: Read> LineSource<R> {
    /// Create a line source over `reader`
    pub fn new(reader: R, config: ReaderConfig) -> Self {
        Self {
            reader,
            config,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Share an existing metrics instance
    pub fn with_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Lazy sequence of lines, trailing `\n` stripped
    ///
    /// Finite when the stream reaches EOF. Both modes yield the same sequence.
    pub fn lines(self, mode: ReadMode) -> Lines<R> {
        let reader = match mode {
            ReadMode::Buffered => LineReader::Buffered(BufReader::new(self.reader)),
            ReadMode::Unbuffered => LineReader::Unbuffered(self.reader),
        };
        Lines {
            reader,
            pending: Vec::new(),
            config: self.config,
            metrics: self.metrics,
            failures: 0,
            done: false,
        }
    }
}

enum LineReader<R> {
    Buffered(BufReader<R>),
    Unbuffered(R),
}

enum ReadOutcome {
    /// A terminator was consumed
    Line,
    /// The stream is exhausted
    Eof,
}

impl<R: Read> LineReader<R> {
    /// Append bytes up to and including the next `\n` to `buf`
    ///
    /// Bytes read before an error stay in `buf`, so a retry continues the same line.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<ReadOutcome> {
        match self {
            Self::Buffered(reader) => {
                let n = reader.read_until(b'\n', buf)?;
                if n > 0 && buf.ends_with(b"\n") {
                    Ok(ReadOutcome::Line)
                } else {
                    Ok(ReadOutcome::Eof)
                }
            }
            Self::Unbuffered(reader) => {
                let mut byte = [0u8; 1];
                loop {
                    if reader.read(&mut byte)? == 0 {
                        return Ok(ReadOutcome::Eof);
                    }
                    buf.push(byte[0]);
                    if byte[0] == b'\n' {
                        return Ok(ReadOutcome::Line);
                    }
                }
            }
        }
    }
}

/// Iterator returned by [`LineSource::lines`]
///
/// Transient errors are retried after a warning; once `max_consecutive_failures`
/// happen in a row, or on any other error, the error is yielded and the sequence ends.
pub struct Lines<R> {
    reader: LineReader<R>,
    pending: Vec<u8>,
    config: ReaderConfig,
    metrics: Arc<IngestionMetrics>,
    failures: u32,
    done: bool,
}

impl<R> Lines<R> {
    fn take_line(&mut self) -> String {
        let mut raw = std::mem::take(&mut self.pending);
        self.metrics.record_line(raw.len());
        metrics::counter!("rotator_lines_read_total").increment(1);

        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

impl<R: Read> Iterator for Lines<R> {
    type Item = Result<String, IngestionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.reader.read_line(&mut self.pending) {
                Ok(ReadOutcome::Line) => {
                    self.failures = 0;
                    return Some(Ok(self.take_line()));
                }
                Ok(ReadOutcome::Eof) => {
                    self.done = true;
                    debug!("input reached EOF");
                    if self.pending.is_empty() {
                        return None;
                    }
                    return Some(Ok(self.take_line()));
                }
                Err(e) if is_transient(&e) => {
                    self.failures += 1;
                    self.metrics.record_transient_error();
                    metrics::counter!("rotator_read_errors_total", "kind" => "transient")
                        .increment(1);

                    if self.failures >= self.config.max_consecutive_failures {
                        self.done = true;
                        return Some(Err(IngestionError::TooManyFailures {
                            attempts: self.failures,
                            source: e,
                        }));
                    }

                    warn!(
                        error = %e,
                        attempt = self.failures,
                        max = self.config.max_consecutive_failures,
                        "Transient read error, retrying"
                    );
                    if !self.config.retry_backoff.is_zero() {
                        std::thread::sleep(self.config.retry_backoff);
                    }
                }
                Err(e) => {
                    self.done = true;
                    metrics::counter!("rotator_read_errors_total", "kind" => "fatal").increment(1);
                    return Some(Err(IngestionError::Read { source: e }));
                }
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
