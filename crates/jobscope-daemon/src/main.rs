//! jobscope daemon
//!
//! Recurring-job runner with scope-per-execution dependency lifecycles.
//!
//! # Usage
//!
//! ```bash
//! jobscope run [--marketplace amazon|jet] [--interval SECS] [--cron EXPR]
//! jobscope validate
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (`--config jobscope.toml`)
//! 3. CLI flags

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobscope_daemon::{commands, Cli, Commands, DaemonConfig};

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut config = DaemonConfig::load(cli.config.as_deref().map(Path::new))?;

    match cli.command {
        Commands::Run {
            marketplace,
            interval,
            cron,
        } => {
            if let Some(marketplace) = marketplace {
                config.marketplace = marketplace;
            }
            if let Some(interval) = interval {
                config.interval_secs = interval;
            }
            if cron.is_some() {
                config.cron = cron;
            }
            commands::run(config).await?;
        }
        Commands::Validate => {
            commands::validate(&config)?;
        }
    }

    Ok(())
}
