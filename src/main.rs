//! Scorecast - Main Entry Point
//!
//! Runs the writing-score workflow end to end.

use clap::Parser;
use scorecast::cli::{cmd_run, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    cmd_run(&cli)?;

    Ok(())
}
