//! jobscope daemon library exports.
//!
//! This crate is the composition root: it builds the process-wide binding
//! tables once at startup, registers the demo feed-sync job with the
//! scheduler and runs it until interrupted.
//!
//! # Modules
//!
//! - `cli`: command-line argument parsing with clap
//! - `config`: TOML configuration with CLI overrides
//! - `feeds`: the demo marketplace feed domain (resource + variants)
//! - `jobs`: the feed-sync job type and the job binding table
//! - `commands`: command implementations (run, validate)

pub mod cli;
pub mod commands;
pub mod config;
pub mod feeds;
pub mod jobs;

pub use cli::{Cli, Commands};
pub use commands::{run, validate};
pub use config::{DaemonConfig, DaemonError};
pub use feeds::{feed_bindings, FeedBindings, FeedConnection, FeedLabeler, UnitCounter};
pub use jobs::{job_bindings, FeedSyncJob, FEED_SYNC};
