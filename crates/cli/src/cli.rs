//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Rotator - relay stdin lines into a file that can be rotated while running
#[derive(Parser, Debug)]
#[command(
    name = "rotator",
    author,
    version,
    about = "Relay stdin lines into a rotatable output file",
    long_about = "Reads newline-delimited text from stdin and appends every line to an output \n\
                  file. The file can be rotated without stopping the relay: after an external \n\
                  rename (watched), on a signal (signaled) or past a size limit (sizecount)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ROTATOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ROTATOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relay stdin into the output file until EOF or shutdown
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
///
/// Flags override values from the configuration file.
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "ROTATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output file path
    #[arg(short, long, env = "ROTATOR_PATH")]
    pub path: Option<PathBuf>,

    /// Rotation strategy
    #[arg(short, long, value_enum, env = "ROTATOR_MODE")]
    pub mode: Option<ModeArg>,

    /// Signal that triggers a reopen (signaled mode), e.g. HUP or SIGUSR1
    #[arg(long, env = "ROTATOR_SIGNAL")]
    pub signal: Option<String>,

    /// Size after which the file rotates (sizecount mode), e.g. "10 MB"
    #[arg(long, env = "ROTATOR_SIZE")]
    pub size: Option<String>,

    /// Number of backups kept (sizecount mode)
    #[arg(long, env = "ROTATOR_COUNT")]
    pub count: Option<usize>,

    /// Read stdin through a read-ahead buffer
    #[arg(long)]
    pub buffered: bool,

    /// Truncate an existing output file on the initial open
    #[arg(long)]
    pub truncate: bool,

    /// Lines queued between the reader thread and the relay
    #[arg(long, env = "ROTATOR_CHANNEL_CAPACITY")]
    pub channel_capacity: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ROTATOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "rotator.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Rotation strategy flag
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Reopen when the file is renamed or removed
    Watched,
    /// Reopen when a signal is delivered
    Signaled,
    /// Rotate through numbered backups past a size limit
    Sizecount,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
