//! # gw-thrash
//!
//! Thrash gateway daemons while verifying data-path health.
//!
//! ## Commands
//!
//! - `run`: Thrash every configured role for the run duration
//! - `validate`: Check a run file without touching any host
//!
//! ## Example
//!
//! ```bash
//! # Check the run file
//! gw-thrash validate --config run.toml
//!
//! # Thrash for ten minutes with a fixed seed
//! gw-thrash run --config run.toml --duration 600 --seed 42
//! ```
//!
//! Exits non-zero if any thrasher or the verifier captured a failure.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{run, validate};

/// Thrash gateway daemons while verifying data-path health.
#[derive(Parser, Debug)]
#[command(name = "gw-thrash")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Thrash and verify for the run duration
    Run {
        /// Run file
        #[arg(long, short)]
        config: PathBuf,

        /// Run length in seconds (overrides the run file)
        #[arg(long)]
        duration: Option<u64>,

        /// RNG seed (overrides the run file)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate a run file
    Validate {
        /// Run file
        #[arg(long, short)]
        config: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run {
            config,
            duration,
            seed,
        } => {
            run::run(&config, duration, seed).await?;
        }
        Commands::Validate { config } => {
            validate::run(&config).await?;
        }
    }

    Ok(())
}
