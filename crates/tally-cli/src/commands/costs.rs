//! Costs command implementation

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tally_core::{aggregate_costs, run, SourceTag};

use super::{load_documents, parse_dimensions, parse_warehouse_tag, print_issues, print_summaries};

pub fn cmd_costs(files: &[PathBuf], warehouse: &str, by: &[String], json_out: bool) -> Result<()> {
    let provider = parse_warehouse_tag(warehouse)?;
    let dims = parse_dimensions(by)?;

    let documents = load_documents(files)?
        .into_iter()
        .map(|doc| (doc, SourceTag::Warehouse(provider)))
        .collect();
    let out = run(documents);
    let summaries = aggregate_costs(&out.costs, &dims);

    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "costs": summaries,
                "documents": out.summaries,
                "issues": out.issues,
            }))?
        );
        return Ok(());
    }

    print_summaries(&format!("{} fulfillment cost", provider), &summaries);
    print_issues(&out.issues);
    Ok(())
}
