//! Tally Core Library
//!
//! Shared functionality for the tally reconciliation tool:
//! - Source parsers for platform and warehouse billing exports
//! - Filename inference for site codes, billing months, and
//!   sequence-encoded invoice dates
//! - Keyword classification of free-text fee descriptions
//! - Transfer/withdrawal filtering for platform ledgers
//! - Exact-decimal aggregation into monthly summaries
//! - Revenue-vs-cost joining into per-store net results

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod filename;
pub mod import;
pub mod join;
pub mod models;
pub mod pipeline;

pub use aggregate::{
    aggregate_costs, aggregate_transactions, merge_summaries, Dimension, RevenueAggregation,
    Summary,
};
pub use classify::{classify_cost, is_transfer};
pub use error::{Error, Result};
pub use import::{
    parse_platform, parse_warehouse, PlatformParse, SheetData, SourceDocument, WarehouseParse,
};
pub use join::{join_net, Money, NetResult};
pub use models::{
    CostType, DocumentKind, DocumentSummary, Issue, IssueKind, Platform, SourceTag, Transaction,
    WarehouseCost, WarehouseProvider,
};
pub use pipeline::{resolve_tags, run, run_tagged, RunOutput};
