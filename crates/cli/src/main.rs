//! # Rotator CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - stdin → 文件的行转发与轮转
//! - 优雅关闭处理与退出码映射

mod cli;
mod commands;
mod error;
mod pipeline;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use cli::{Cli, Commands};
use commands::{run_relay, run_validate};
use observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    if let Err(e) = init_logging(&cli) {
        eprintln!("rotator: {e:#}");
        return ExitCode::from(1);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Rotator starting");

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_relay(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, exit_code = e.exit_code(), "Command failed");
            eprintln!("rotator: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initialize logging and metrics based on CLI options
///
/// Logs go to stderr.
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability_config(cli))
}

fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let config = ObservabilityConfig::default()
        .with_verbosity(cli.verbose, cli.quiet)
        .with_log_format(cli.log_format.into());
    match &cli.command {
        Commands::Run(args) => config.with_metrics_port(args.metrics_port),
        Commands::Validate(_) => config,
    }
}
