//! Command implementations

mod costs;
mod net;
mod revenue;

pub use costs::cmd_costs;
pub use net::cmd_net;
pub use revenue::cmd_revenue;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tally_core::{Dimension, Issue, Platform, SheetData, SourceDocument, Summary, WarehouseProvider};

/// Decode one exported file into the document shape the core consumes.
///
/// - `.csv` becomes a single raw-grid sheet named after the file stem
///   (warehouse workbooks exported sheet-per-file keep their sheet
///   semantics through the stem)
/// - `.txt` becomes extracted text, with `Label: value` lines lifted
///   into labeled fields
pub fn load_document(path: &Path) -> Result<SourceDocument> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Unreadable file name: {}", path.display()))?;
    let stem = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("Sheet1")
        .to_string();

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record?;
                rows.push(record.iter().map(str::to_string).collect());
            }
            Ok(SourceDocument::tabular(name, vec![SheetData::new(stem, rows)]))
        }
        Some("txt") | Some("text") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let fields = text
                .lines()
                .filter_map(|line| {
                    let (key, value) = line.split_once(':')?;
                    let key = key.trim();
                    let value = value.trim();
                    if key.is_empty() || value.is_empty() {
                        None
                    } else {
                        Some((key.to_string(), value.to_string()))
                    }
                })
                .collect();
            Ok(SourceDocument::text_document(name, text, fields))
        }
        _ => bail!(
            "Unsupported file type: {} (expected .csv or .txt)",
            path.display()
        ),
    }
}

pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    let documents: Result<Vec<_>> = paths.iter().map(|p| load_document(p)).collect();
    if let Ok(docs) = &documents {
        tracing::debug!(files = docs.len(), "loaded documents");
    }
    documents
}

pub fn parse_platform_tag(tag: &str) -> Result<Platform> {
    tag.parse::<Platform>().map_err(|e| anyhow::anyhow!(e))
}

pub fn parse_warehouse_tag(tag: &str) -> Result<WarehouseProvider> {
    tag.parse::<WarehouseProvider>().map_err(|e| anyhow::anyhow!(e))
}

pub fn parse_dimensions(by: &[String]) -> Result<Vec<Dimension>> {
    by.iter()
        .map(|s| s.parse::<Dimension>().map_err(|e| anyhow::anyhow!(e)))
        .collect()
}

/// Render a summary list as an aligned table
pub fn print_summaries(title: &str, summaries: &[Summary]) {
    println!();
    println!("📊 {}", title);
    println!("   ─────────────────────────────────────────────────────────────");
    if summaries.is_empty() {
        println!("   No activity.");
        return;
    }
    for s in summaries {
        let key = s
            .key
            .iter()
            .map(|(d, v)| {
                if v.is_empty() {
                    format!("{}=-", d)
                } else {
                    format!("{}={}", d, v)
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("   {:56} │ {:>14} {} │ {:>5} rec", key, s.total, s.currency, s.record_count);
        for (cost_type, amount) in &s.by_cost_type {
            println!("      {:20} {:>14}", cost_type.to_string(), amount);
        }
    }
}

/// Render the warnings that accompany every run
pub fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    println!();
    println!("⚠️  {} document issue(s)", issues.len());
    for issue in issues {
        println!("   {:30} {} — {}", issue.source_file, issue.kind, issue.detail);
    }
}
