//! `run` command implementation.

use std::future::Future;

use contracts::{OpenMode, RelayConfig, RotationConfig, RotationSpec, SignalKind};
use tokio::signal::unix::{signal, Signal};
use tracing::{info, warn};

use crate::cli::{ModeArg, RunArgs};
use crate::error::{CliError, Result};
use crate::pipeline::Pipeline;

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        path = %config.path.display(),
        mode = %config.rotation.mode(),
        open_mode = ?config.open_mode,
        buffered = config.buffered,
        "Configuration loaded"
    );

    let rotation_signal = match config.rotation.resolve()? {
        RotationSpec::Signaled { signal } => Some(signal),
        _ => None,
    };
    let shutdown = shutdown_signal(rotation_signal)?;

    let stats = Pipeline::new(config)
        .run(std::io::stdin(), shutdown)
        .await?;

    info!(
        lines = stats.relay.lines,
        bytes = stats.relay.bytes,
        rotations = stats.relay.rotations,
        generation = stats.relay.generation,
        duration_secs = stats.duration.as_secs_f64(),
        lines_per_sec = format!("{:.2}", stats.relay.lines_per_sec()),
        "Relay completed"
    );
    stats.print_summary();

    Ok(())
}

/// Load the configuration file (if any) and apply command-line overrides
pub fn resolve_config(args: &RunArgs) -> Result<RelayConfig> {
    let mut config = match (&args.config, &args.path) {
        (Some(file), _) => {
            info!(config = %file.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(file)?
        }
        (None, Some(path)) => RelayConfig::new(path),
        (None, None) => {
            return Err(CliError::config_validation(
                "path",
                "either --config or --path is required",
            ))
        }
    };

    if let Some(ref path) = args.path {
        config.path = path.clone();
    }
    if args.buffered {
        config.buffered = true;
    }
    if args.truncate {
        config.open_mode = OpenMode::Truncate;
    }
    if let Some(capacity) = args.channel_capacity {
        config.channel_capacity = capacity;
    }
    config.rotation = rotation_overrides(config.rotation, args)?;

    config_loader::validate(&config)?;
    Ok(config)
}

/// Apply `--mode`, `--signal`, `--size` and `--count` to the configured strategy
///
/// Without `--mode` the flags refine the strategy from the file; a flag that does not
/// belong to the resulting strategy is rejected.
fn rotation_overrides(current: RotationConfig, args: &RunArgs) -> Result<RotationConfig> {
    let base = match args.mode {
        None => current,
        Some(mode) if mode == mode_of(&current) => current,
        Some(ModeArg::Watched) => RotationConfig::Watched,
        Some(ModeArg::Signaled) => RotationConfig::Signaled {
            signal: SignalKind::Hup.name().to_string(),
        },
        Some(ModeArg::Sizecount) => RotationConfig::SizeCount {
            size: None,
            count: None,
        },
    };

    match base {
        RotationConfig::Watched => {
            reject_flag(args.signal.is_some(), "--signal", "signaled")?;
            reject_flag(args.size.is_some(), "--size", "sizecount")?;
            reject_flag(args.count.is_some(), "--count", "sizecount")?;
            Ok(RotationConfig::Watched)
        }
        RotationConfig::Signaled { signal } => {
            reject_flag(args.size.is_some(), "--size", "sizecount")?;
            reject_flag(args.count.is_some(), "--count", "sizecount")?;
            Ok(RotationConfig::Signaled {
                signal: args.signal.clone().unwrap_or(signal),
            })
        }
        RotationConfig::SizeCount { size, count } => {
            reject_flag(args.signal.is_some(), "--signal", "signaled")?;
            Ok(RotationConfig::SizeCount {
                size: args.size.clone().or(size),
                count: args.count.or(count),
            })
        }
    }
}

fn mode_of(rotation: &RotationConfig) -> ModeArg {
    match rotation {
        RotationConfig::Watched => ModeArg::Watched,
        RotationConfig::Signaled { .. } => ModeArg::Signaled,
        RotationConfig::SizeCount { .. } => ModeArg::Sizecount,
    }
}

fn reject_flag(present: bool, flag: &str, mode: &str) -> Result<()> {
    if present {
        return Err(CliError::config_validation(
            "rotation",
            format!("{flag} requires --mode {mode}"),
        ));
    }
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
///
/// A signal configured for rotation is not used for shutdown.
fn shutdown_signal(rotation: Option<SignalKind>) -> Result<impl Future<Output = ()>> {
    let interrupt = register_shutdown(SignalKind::Int, rotation)?;
    let terminate = register_shutdown(SignalKind::Term, rotation)?;

    Ok(async move {
        tokio::select! {
            () = wait_for(interrupt) => warn!("Received SIGINT, stopping relay..."),
            () = wait_for(terminate) => warn!("Received SIGTERM, stopping relay..."),
        }
    })
}

fn register_shutdown(kind: SignalKind, rotation: Option<SignalKind>) -> Result<Option<Signal>> {
    if rotation == Some(kind) {
        info!(signal = %kind, "Signal reserved for rotation, not used for shutdown");
        return Ok(None);
    }
    let stream = signal(tokio::signal::unix::SignalKind::from_raw(kind.raw()))?;
    Ok(Some(stream))
}

async fn wait_for(signal: Option<Signal>) {
    match signal {
        Some(mut stream) => {
            stream.recv().await;
        }
        None => std::future::pending().await,
    }
}
