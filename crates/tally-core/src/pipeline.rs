//! Pipeline run loop
//!
//! Routes each extracted document to its parser and concatenates the
//! per-document results. Every parse is a pure function of one
//! document's content, returning its own record list; nothing is
//! accumulated through shared state, so the loop could run the parses
//! concurrently without changing any output.
//!
//! Tag resolution happens up front: an unknown tag is a configuration
//! error and fails the run before any document is parsed. Everything
//! after that point is document-scoped and non-fatal.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::import::{parse_platform, parse_warehouse, SourceDocument};
use crate::models::{DocumentSummary, Issue, SourceTag, Transaction, WarehouseCost};

/// Everything a run produces: the normalized records, per-document
/// stats, and the warning list that always accompanies the results.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub transactions: Vec<Transaction>,
    pub costs: Vec<WarehouseCost>,
    pub summaries: Vec<DocumentSummary>,
    pub issues: Vec<Issue>,
}

/// Resolve string routing tags before parsing. Any unknown tag fails
/// the whole run immediately — a misconfigured route must not silently
/// drop a source family.
pub fn resolve_tags(
    documents: Vec<(SourceDocument, String)>,
) -> Result<Vec<(SourceDocument, SourceTag)>> {
    documents
        .into_iter()
        .map(|(doc, tag)| {
            let parsed = tag
                .parse::<SourceTag>()
                .map_err(|_| Error::UnknownSource(tag.clone()))?;
            Ok((doc, parsed))
        })
        .collect()
}

/// Parse every document and reduce the per-document results into one
/// output. Document-scoped failures land in `issues`; the run itself
/// cannot fail once tags are resolved.
pub fn run(documents: Vec<(SourceDocument, SourceTag)>) -> RunOutput {
    let mut out = RunOutput::default();

    for (doc, tag) in documents {
        match tag {
            SourceTag::Platform(platform) => {
                let parsed = parse_platform(&doc, platform);
                out.transactions.extend(parsed.transactions);
                report(&parsed.summary, &parsed.issues);
                out.summaries.push(parsed.summary);
                out.issues.extend(parsed.issues);
            }
            SourceTag::Warehouse(provider) => {
                let parsed = parse_warehouse(&doc, provider);
                out.costs.extend(parsed.costs);
                report(&parsed.summary, &parsed.issues);
                out.summaries.push(parsed.summary);
                out.issues.extend(parsed.issues);
            }
        }
    }

    info!(
        documents = out.summaries.len(),
        transactions = out.transactions.len(),
        costs = out.costs.len(),
        issues = out.issues.len(),
        "run complete"
    );
    out
}

/// Resolve tags, then run.
pub fn run_tagged(documents: Vec<(SourceDocument, String)>) -> Result<RunOutput> {
    Ok(run(resolve_tags(documents)?))
}

fn report(summary: &DocumentSummary, issues: &[Issue]) {
    info!(
        file = %summary.source_file,
        source = %summary.source,
        records = summary.record_count,
        "parsed document"
    );
    for issue in issues {
        warn!(
            file = %issue.source_file,
            kind = %issue.kind,
            detail = %issue.detail,
            "document issue"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SheetData;
    use crate::models::IssueKind;
    use rust_decimal_macros::dec;

    fn managed_doc() -> SourceDocument {
        SourceDocument::tabular(
            "store 收支明细_20250701.xlsx",
            vec![SheetData::new(
                "Sheet1",
                vec![
                    vec!["费用项".into(), "结算时间".into(), "金额(CNY)".into()],
                    vec!["供货款".into(), "2025/07/30 08:40:25".into(), "50.00".into()],
                ],
            )],
        )
    }

    fn g7_doc(name: &str, text: &str) -> SourceDocument {
        SourceDocument::text_document(name, text, vec![])
    }

    #[test]
    fn test_run_mixed_sources() {
        let out = run(vec![
            (
                managed_doc(),
                SourceTag::Platform(crate::models::Platform::ManagedStore),
            ),
            (
                g7_doc("702510206R.pdf", "Total Amount: 100.00"),
                SourceTag::Warehouse(crate::models::WarehouseProvider::G7),
            ),
        ]);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.costs.len(), 1);
        assert_eq!(out.summaries.len(), 2);
        assert!(out.issues.is_empty());
        assert_eq!(out.costs[0].amount, dec!(100.00));
    }

    #[test]
    fn test_unknown_tag_is_fatal_before_parsing() {
        let err = run_tagged(vec![(managed_doc(), "ebay".to_string())]).unwrap_err();
        assert!(matches!(err, Error::UnknownSource(tag) if tag == "ebay"));
    }

    #[test]
    fn test_bad_document_does_not_stop_the_run() {
        let out = run(vec![
            (
                g7_doc("702513206R.pdf", "Total Amount: 10.00"), // invalid month 13
                SourceTag::Warehouse(crate::models::WarehouseProvider::G7),
            ),
            (
                g7_doc("702510206R.pdf", "Total Amount: 20.00"),
                SourceTag::Warehouse(crate::models::WarehouseProvider::G7),
            ),
        ]);
        assert_eq!(out.costs.len(), 1);
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].kind, IssueKind::UnparseableFilename);
    }
}
