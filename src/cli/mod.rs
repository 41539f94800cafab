//! CLI interface for poly-watch
//!
//! Provides subcommands for:
//! - `run`: replay a tape file through the core and report decisions
//! - `params`: validate and summarize the parameter document

mod params;
mod run;

pub use params::ParamsArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "poly-watch")]
#[command(about = "Watch-trader replication core for Polymarket up/down markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a JSONL tape through the core
    Run(RunArgs),
    /// Validate and summarize the parameter document
    Params(ParamsArgs),
}
