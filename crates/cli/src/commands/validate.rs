//! `validate` command implementation.

use anyhow::Context;
use contracts::{RelayConfig, RotationSpec};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::{CliError, Result};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    path: String,
    mode: String,
    open_mode: String,
    buffered: bool,
    channel_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    signal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_files: Option<usize>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let (result, failure) = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => (valid_result(args, &config)?, None),
        Err(e) => (
            ValidationResult {
                valid: false,
                config_path: args.config.display().to_string(),
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            },
            Some(e),
        ),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    match failure {
        None => Ok(()),
        Some(e) => Err(CliError::Config(e)),
    }
}

fn valid_result(args: &ValidateArgs, config: &RelayConfig) -> Result<ValidationResult> {
    let rotation = config.rotation.resolve()?;
    let warnings = collect_warnings(config, rotation);

    let (signal, max_bytes, max_files) = match rotation {
        RotationSpec::Watched => (None, None, None),
        RotationSpec::Signaled { signal } => (Some(signal.to_string()), None, None),
        RotationSpec::SizeCount {
            max_bytes,
            max_files,
        } => (None, max_bytes.map(|b| b.bytes()), Some(max_files)),
    };

    Ok(ValidationResult {
        valid: true,
        config_path: args.config.display().to_string(),
        error: None,
        warnings: (!warnings.is_empty()).then_some(warnings),
        summary: Some(ConfigSummary {
            version: format!("{:?}", config.version),
            path: config.path.display().to_string(),
            mode: config.rotation.mode().to_string(),
            open_mode: format!("{:?}", config.open_mode).to_lowercase(),
            buffered: config.buffered,
            channel_capacity: config.channel_capacity,
            signal,
            max_bytes,
            max_files,
        }),
    })
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RelayConfig, rotation: RotationSpec) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            warnings.push(format!(
                "Output directory '{}' does not exist",
                parent.display()
            ));
        }
    }

    match rotation {
        RotationSpec::Signaled { signal } if signal.is_shutdown() => {
            warnings.push(format!(
                "{signal} is used for rotation and no longer stops the relay"
            ));
        }
        RotationSpec::SizeCount {
            max_bytes: None, ..
        } => {
            warnings.push("No size configured - the file never rotates by size".to_string());
        }
        RotationSpec::SizeCount {
            max_bytes: Some(size),
            ..
        } if size.bytes() == 0 => {
            warnings.push("Size 0 rotates the file after every line".to_string());
        }
        _ => {}
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Output: {} ({})", summary.path, summary.open_mode);
            println!("  Mode: {}", summary.mode);
            if let Some(ref signal) = summary.signal {
                println!("  Signal: {signal}");
            }
            if let Some(max_bytes) = summary.max_bytes {
                println!("  Max bytes: {max_bytes}");
            }
            if let Some(max_files) = summary.max_files {
                println!("  Max files: {max_files}");
            }
            println!("  Buffered input: {}", summary.buffered);
            println!("  Channel capacity: {}", summary.channel_capacity);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
