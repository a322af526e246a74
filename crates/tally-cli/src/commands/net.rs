//! Net command implementation: revenue × cost join

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tally_core::{
    aggregate_costs, aggregate_transactions, join_net, run, Dimension, Money, SourceTag,
};

use super::{load_documents, parse_platform_tag, parse_warehouse_tag, print_issues};

fn money(side: &Option<Money>) -> String {
    match side {
        Some(m) => format!("{} {}", m.amount, m.currency),
        None => "—".to_string(),
    }
}

pub fn cmd_net(
    revenue_files: &[PathBuf],
    platform: &str,
    cost_files: &[PathBuf],
    warehouse: &str,
    json_out: bool,
) -> Result<()> {
    let platform = parse_platform_tag(platform)?;
    let provider = parse_warehouse_tag(warehouse)?;

    let mut documents: Vec<_> = load_documents(revenue_files)?
        .into_iter()
        .map(|doc| (doc, SourceTag::Platform(platform)))
        .collect();
    documents.extend(
        load_documents(cost_files)?
            .into_iter()
            .map(|doc| (doc, SourceTag::Warehouse(provider))),
    );
    let out = run(documents);

    // the join key is (store, month); currency rides along in the key
    let dims = [Dimension::Store, Dimension::Period];
    let revenue = aggregate_transactions(&out.transactions, &dims);
    let costs = aggregate_costs(&out.costs, &dims);
    let results = join_net(&revenue.revenue, &costs);

    if json_out {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "net": results,
                "issues": out.issues,
            }))?
        );
        return Ok(());
    }

    println!();
    println!("📊 Net by store and month");
    println!("   ─────────────────────────────────────────────────────────────");
    if results.is_empty() {
        println!("   No activity.");
    }
    for r in &results {
        let net = r
            .net
            .map(|n| n.to_string())
            .unwrap_or_else(|| "—".to_string());
        println!(
            "   {:20} {:8} │ revenue {:>16} │ cost {:>16} │ net {:>12}",
            r.store_id,
            r.billing_period,
            money(&r.revenue),
            money(&r.cost),
            net,
        );
    }
    print_issues(&out.issues);
    Ok(())
}
