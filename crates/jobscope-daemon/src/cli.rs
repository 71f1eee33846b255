//! CLI argument parsing for the jobscope daemon.

use clap::{Parser, Subcommand};

use jobscope_types::Marketplace;

/// jobscope daemon
///
/// Runs recurring jobs where every execution gets its own isolated,
/// deterministically released set of dependencies.
#[derive(Parser, Debug)]
#[command(name = "jobscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler in the foreground until Ctrl-C
    Run {
        /// Override the marketplace selector (amazon, jet)
        #[arg(short, long)]
        marketplace: Option<Marketplace>,

        /// Override the firing interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Override with a cron expression (6-field)
        #[arg(long)]
        cron: Option<String>,
    },

    /// Validate configuration and bindings wiring without scheduling
    Validate,
}
