//! SHEIN completed-bill export parser
//!
//! Product-dimension settlement exports: one sheet, sometimes with a
//! summary line above the header stating the document total. When that
//! stated total is present, the line items must reconcile with it
//! within the fixed epsilon or the whole document is excluded — a
//! partially extracted bill must not be silently trusted.

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use tracing::debug;

use super::{
    cell, find_column, parse_amount, parse_date, totals_match, PlatformParse, SourceDocument,
};
use crate::filename::{billing_period, site_currency};
use crate::models::{DocumentSummary, Issue, IssueKind, Platform, Transaction};

const SHEIN_SITES: &[&str] = &["UK", "DE", "FR", "IT", "ES", "US"];

fn filename_site(filename: &str) -> Option<String> {
    static SITE: OnceLock<Regex> = OnceLock::new();
    let re = SITE.get_or_init(|| {
        Regex::new(r"(UK|DE|FR|IT|ES|US)").expect("hardcoded regex")
    });
    re.find(filename).map(|m| m.as_str().to_string())
}

fn store_name(filename: &str) -> String {
    if let Some(idx) = filename.find("已完成账单") {
        let prefix = filename[..idx].trim();
        if !prefix.is_empty() {
            return prefix.to_string();
        }
    }
    filename.split('.').next().unwrap_or(filename).to_string()
}

/// Find the header row: the first row naming the order or amount column
fn header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().take(5).position(|row| {
        row.iter()
            .any(|c| c.contains("订单号") || c.contains("应收金额"))
    })
}

/// A stated total in the summary rows above the header, e.g.
/// `应收金额合计` next to or containing the amount
fn stated_total(rows: &[Vec<String>]) -> Option<Decimal> {
    for row in rows {
        for (i, c) in row.iter().enumerate() {
            if c.contains("合计") || c.to_lowercase().contains("total") {
                if let Some(amount) = c
                    .split(|ch: char| ch == ':' || ch == '：')
                    .nth(1)
                    .and_then(parse_amount)
                {
                    return Some(amount);
                }
                if let Some(amount) = row[i + 1..].iter().find_map(|v| parse_amount(v)) {
                    return Some(amount);
                }
            }
        }
    }
    None
}

pub(super) fn parse(doc: &SourceDocument) -> PlatformParse {
    let mut out = PlatformParse {
        summary: DocumentSummary {
            source_file: doc.name.clone(),
            source: Platform::Shein.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let rows = match doc.sheets.first() {
        Some(sheet) if !sheet.rows.is_empty() => &sheet.rows,
        _ => {
            out.issues.push(Issue::new(
                &doc.name,
                IssueKind::EmptyDocument,
                "no tabular content",
            ));
            return out;
        }
    };

    let Some(header_idx) = header_row(rows) else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnrecognizedDocumentType,
            "no billing header row found",
        ));
        return out;
    };
    let headers: Vec<String> = rows[header_idx].iter().map(|h| h.trim().to_string()).collect();
    let stated = stated_total(&rows[..header_idx]);

    let order_col = find_column(&headers, &["订单号", "order"]);
    let amount_col = find_column(&headers, &["应收金额"]).or_else(|| {
        // fall back to the last column holding parseable amounts
        let data = rows.get(header_idx + 1)?;
        (0..headers.len())
            .rev()
            .find(|&i| cell(data, Some(i)).and_then(parse_amount).is_some())
    });
    let Some(amount_col) = amount_col else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnrecognizedDocumentType,
            "no amount column found",
        ));
        return out;
    };
    let date_col = find_column(&headers, &["打款日期", "签收"]);
    let type_col = find_column(&headers, &["账单类型"]);
    let site_col = find_column(&headers, &["站点"]);

    let mut site = filename_site(&doc.name);
    if site.is_none() {
        site = rows
            .get(header_idx + 1)
            .and_then(|r| cell(r, site_col))
            .and_then(|v| {
                let upper = v.to_uppercase();
                SHEIN_SITES
                    .iter()
                    .find(|s| upper.contains(*s))
                    .map(|s| s.to_string())
            });
    }
    if site.is_none() {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::MissingSite,
            "site not present in filename or 站点 column",
        ));
    }
    let currency = site
        .as_deref()
        .and_then(site_currency)
        .unwrap_or("USD")
        .to_string();

    let store = store_name(&doc.name);
    let store_id = match &site {
        Some(s) => format!("{}_{}", store, s).to_lowercase().replace(' ', "_"),
        None => store.to_lowercase().replace(' ', "_"),
    };

    let mut line_sum = Decimal::ZERO;
    for (offset, row) in rows[header_idx + 1..].iter().enumerate() {
        out.summary.total_rows += 1;
        let Some(amount) = cell(row, Some(amount_col)).and_then(parse_amount) else {
            out.summary.skipped_rows += 1;
            continue;
        };
        let date = cell(row, date_col).and_then(parse_date);
        let type_raw = cell(row, type_col).unwrap_or_default().to_string();

        line_sum += amount;
        out.transactions.push(Transaction {
            store_id: store_id.clone(),
            platform: Platform::Shein,
            site: site.clone(),
            currency: currency.clone(),
            amount,
            transaction_type_raw: type_raw,
            is_transfer: false,
            transaction_date: date,
            billing_period: date.map(billing_period).unwrap_or_default(),
            source_file: doc.name.clone(),
            row_number: header_idx + 2 + offset,
        });
        out.summary.parsed_rows += 1;
    }

    if let Some(stated) = stated {
        if totals_match(line_sum, stated) {
            out.summary.verified_rows = out.summary.parsed_rows;
        } else {
            out.issues.push(Issue::new(
                &doc.name,
                IssueKind::TotalMismatch,
                format!("line items sum to {} but the bill states {}", line_sum, stated),
            ));
            out.summary.mismatched_rows = out.summary.parsed_rows;
            out.transactions.clear();
            out.summary.record_count = 0;
            return out;
        }
    }

    out.summary.record_count = out.transactions.len();
    out.summary.net_amount = line_sum;
    out.summary.currency = Some(currency);
    out.summary.site = site;
    out.summary.billing_period = out
        .transactions
        .iter()
        .find(|t| !t.billing_period.is_empty())
        .map(|t| t.billing_period.clone());

    debug!(file = %doc.name, records = out.summary.record_count, "parsed shein bill");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SheetData;
    use rust_decimal_macros::dec;

    fn doc(name: &str, rows: &[&[&str]]) -> SourceDocument {
        SourceDocument::tabular(
            name,
            vec![SheetData::new(
                "Sheet1",
                rows.iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect(),
            )],
        )
    }

    #[test]
    fn test_parse_with_stated_total() {
        let parsed = parse(&doc(
            "天基希音UK 已完成账单-账单商品维度-供货价-2025-08-05.xlsx",
            &[
                &["应收金额合计", "27.50"],
                &["订单号", "账单类型", "站点", "打款日期", "应收金额"],
                &["SO-1", "销售", "UK", "2025-07-21", "30.00"],
                &["SO-2", "退款", "UK", "2025-07-25", "-2.50"],
            ],
        ));
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.summary.net_amount, dec!(27.50));
        assert_eq!(parsed.transactions[0].currency, "GBP");
        assert_eq!(parsed.transactions[0].site.as_deref(), Some("UK"));
        assert_eq!(parsed.transactions[1].billing_period, "2025-07");
        assert_eq!(parsed.summary.verified_rows, 2);
    }

    #[test]
    fn test_total_mismatch_excludes_document() {
        let parsed = parse(&doc(
            "天基希音UK 已完成账单-2025-08-05.xlsx",
            &[
                &["应收金额合计", "100.00"],
                &["订单号", "应收金额"],
                &["SO-1", "30.00"],
            ],
        ));
        assert!(parsed.transactions.is_empty());
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind, IssueKind::TotalMismatch);
    }

    #[test]
    fn test_no_stated_total_is_fine() {
        let parsed = parse(&doc(
            "希音DE 已完成账单-2025-08-05.xlsx",
            &[
                &["订单号", "应收金额"],
                &["SO-1", "30.00"],
            ],
        ));
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].currency, "EUR");
    }

    #[test]
    fn test_site_from_body_column() {
        let parsed = parse(&doc(
            "希音 已完成账单-2025-08-05.xlsx",
            &[
                &["订单号", "站点", "应收金额"],
                &["SO-1", "英国站UK", "30.00"],
            ],
        ));
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.transactions[0].site.as_deref(), Some("UK"));
        assert_eq!(parsed.transactions[0].currency, "GBP");
    }

    #[test]
    fn test_missing_site_is_soft() {
        let parsed = parse(&doc(
            "希音 已完成账单-2025-08-05.xlsx",
            &[&["订单号", "应收金额"], &["SO-1", "30.00"]],
        ));
        // records still parse, attribution is flagged
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind, IssueKind::MissingSite);
        assert!(parsed.transactions[0].site.is_none());
    }
}
