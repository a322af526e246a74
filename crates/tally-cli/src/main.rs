//! Tally CLI - cross-border revenue and fulfillment cost reconciliation
//!
//! Usage:
//!   tally revenue --platform amazon FILES...   Summarize platform revenue
//!   tally costs --warehouse g7 FILES...        Summarize warehouse costs
//!   tally net ...                              Join revenue against costs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Revenue {
            files,
            platform,
            by,
        } => commands::cmd_revenue(&files, &platform, &by, cli.json),
        Commands::Costs {
            files,
            warehouse,
            by,
        } => commands::cmd_costs(&files, &warehouse, &by, cli.json),
        Commands::Net {
            revenue_files,
            platform,
            cost_files,
            warehouse,
        } => commands::cmd_net(&revenue_files, &platform, &cost_files, &warehouse, cli.json),
    }
}
