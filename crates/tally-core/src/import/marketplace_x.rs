//! Marketplace-X income/expense flow parser
//!
//! Single-sheet settlement flows where amounts carry a `CN￥` prefix
//! and withdrawals are spelled out in the `收支类型`/`费用项` columns.
//! The currency column is authoritative when present; the ledger
//! defaults to CNY otherwise.

use tracing::debug;

use super::{cell, find_column_exact, parse_amount, parse_date, PlatformParse, SourceDocument};
use crate::classify::is_transfer;
use crate::filename::billing_period;
use crate::models::{DocumentSummary, Issue, IssueKind, Platform, Transaction};

/// Strip the `CN￥`-style currency prefix before numeric parsing
fn parse_flow_amount(s: &str) -> Option<rust_decimal::Decimal> {
    parse_amount(s.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic()))
}

pub(super) fn parse(doc: &SourceDocument) -> PlatformParse {
    let mut out = PlatformParse {
        summary: DocumentSummary {
            source_file: doc.name.clone(),
            source: Platform::MarketplaceX.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let rows = match doc.sheets.first() {
        Some(sheet) if sheet.rows.len() > 1 => &sheet.rows,
        _ => {
            out.issues.push(Issue::new(
                &doc.name,
                IssueKind::EmptyDocument,
                "no flow rows",
            ));
            return out;
        }
    };

    let headers: Vec<String> = rows[0].iter().map(|h| h.trim().to_string()).collect();
    let flow_col = find_column_exact(&headers, &["收支类型"]);
    let fee_col = find_column_exact(&headers, &["费用项"]);
    let amount_col = find_column_exact(&headers, &["变动金额"]);
    let currency_col = find_column_exact(&headers, &["币种"]);
    let time_col = find_column_exact(&headers, &["结算时间"]);

    let Some(amount_col) = amount_col else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnrecognizedDocumentType,
            "no 变动金额 column found",
        ));
        return out;
    };

    for (offset, row) in rows[1..].iter().enumerate() {
        out.summary.total_rows += 1;
        let Some(amount) = cell(row, Some(amount_col)).and_then(parse_flow_amount) else {
            out.summary.skipped_rows += 1;
            continue;
        };

        let flow_type = cell(row, flow_col).unwrap_or_default();
        let fee_item = cell(row, fee_col).unwrap_or_default();
        let transfer = is_transfer(flow_type) || is_transfer(fee_item);
        let type_raw = if fee_item.is_empty() { flow_type } else { fee_item };

        let currency = cell(row, currency_col)
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| "CNY".to_string());
        let date = cell(row, time_col).and_then(parse_date);

        out.summary.net_amount += amount;
        out.transactions.push(Transaction {
            store_id: "marketplace_x".to_string(),
            platform: Platform::MarketplaceX,
            site: None,
            currency,
            amount,
            transaction_type_raw: type_raw.to_string(),
            is_transfer: transfer,
            transaction_date: date,
            billing_period: date.map(billing_period).unwrap_or_default(),
            source_file: doc.name.clone(),
            row_number: offset + 2,
        });
        out.summary.parsed_rows += 1;
    }

    out.summary.record_count = out.transactions.len();
    out.summary.currency = out.transactions.first().map(|t| t.currency.clone());
    out.summary.billing_period = out
        .transactions
        .iter()
        .find(|t| !t.billing_period.is_empty())
        .map(|t| t.billing_period.clone());

    debug!(file = %doc.name, records = out.summary.record_count, "parsed marketplace flow");
    out
}
