//! Revenue command implementation

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tally_core::{aggregate_transactions, run, SourceTag};

use super::{load_documents, parse_dimensions, parse_platform_tag, print_issues, print_summaries};

pub fn cmd_revenue(files: &[PathBuf], platform: &str, by: &[String], json_out: bool) -> Result<()> {
    let platform = parse_platform_tag(platform)?;
    let dims = parse_dimensions(by)?;

    let documents = load_documents(files)?
        .into_iter()
        .map(|doc| (doc, SourceTag::Platform(platform)))
        .collect();
    let out = run(documents);
    let agg = aggregate_transactions(&out.transactions, &dims);

    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "revenue": agg.revenue,
                "transfers": agg.transfers,
                "documents": out.summaries,
                "issues": out.issues,
            }))?
        );
        return Ok(());
    }

    print_summaries(&format!("{} revenue", platform), &agg.revenue);
    if !agg.transfers.is_empty() {
        print_summaries("Withdrawals (excluded from revenue)", &agg.transfers);
    }
    print_issues(&out.issues);
    Ok(())
}
