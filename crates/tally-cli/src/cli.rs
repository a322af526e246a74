//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - reconcile platform revenue against fulfillment cost
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Monthly revenue/cost reconciliation across platforms and warehouses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize platform revenue from billing exports
    Revenue {
        /// Files to parse (.csv tabular exports, .txt extracted scans)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Platform: amazon, temu, shein, managed_store, marketplace_x
        #[arg(short, long)]
        platform: String,

        /// Dimensions to group by (store, source, site, period, currency)
        #[arg(long, value_delimiter = ',', default_value = "store,site,period")]
        by: Vec<String>,
    },

    /// Summarize warehouse fulfillment costs from billing exports
    Costs {
        /// Files to parse (.csv tabular exports, .txt extracted scans)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Warehouse provider: tsp, haiyang, xiyou, g7
        #[arg(short, long)]
        warehouse: String,

        /// Dimensions to group by (store, source, site, period, currency)
        #[arg(long, value_delimiter = ',', default_value = "source,period")]
        by: Vec<String>,
    },

    /// Join monthly revenue against fulfillment cost per store
    Net {
        /// Platform revenue files
        #[arg(long = "revenue", num_args = 1.., required = true)]
        revenue_files: Vec<PathBuf>,

        /// Platform for the revenue files
        #[arg(short, long)]
        platform: String,

        /// Warehouse cost files
        #[arg(long = "costs", num_args = 1.., required = true)]
        cost_files: Vec<PathBuf>,

        /// Warehouse provider for the cost files
        #[arg(short, long)]
        warehouse: String,
    },
}
