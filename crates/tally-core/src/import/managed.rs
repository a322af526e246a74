//! Managed-store income/expense ledger parser
//!
//! Hosted storefronts export a single-sheet CNY ledger where the
//! `费用项` column names the entry: supply payments, after-sale
//! refunds, fulfillment/technology service fees, and withdrawals. The
//! withdrawal entries are cash movement, not revenue, and get the
//! transfer annotation.

use tracing::debug;

use super::{cell, find_column, find_column_exact, parse_amount, parse_date, PlatformParse, SourceDocument};
use crate::classify::is_transfer;
use crate::filename::billing_period;
use crate::models::{DocumentSummary, Issue, IssueKind, Platform, Transaction};

fn store_name(filename: &str) -> String {
    if let Some(idx) = filename.find("收支明细") {
        let prefix = filename[..idx].trim();
        if !prefix.is_empty() {
            return prefix.to_string();
        }
    }
    filename.split('.').next().unwrap_or(filename).to_string()
}

pub(super) fn parse(doc: &SourceDocument) -> PlatformParse {
    let mut out = PlatformParse {
        summary: DocumentSummary {
            source_file: doc.name.clone(),
            source: Platform::ManagedStore.to_string(),
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
                "no ledger rows",
            ));
            return out;
        }
    };

    let headers: Vec<String> = rows[0].iter().map(|h| h.trim().to_string()).collect();
    let fee_col = find_column_exact(&headers, &["费用项"]);
    let amount_col = find_column(&headers, &["金额(CNY)", "金额"]);
    let time_col = find_column_exact(&headers, &["结算时间"]);

    let Some(amount_col) = amount_col else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnrecognizedDocumentType,
            "no 金额 column found",
        ));
        return out;
    };

    let store = store_name(&doc.name);
    let store_id = store.to_lowercase().replace(' ', "_");

    for (offset, row) in rows[1..].iter().enumerate() {
        out.summary.total_rows += 1;
        let Some(fee_item) = cell(row, fee_col) else {
            out.summary.skipped_rows += 1;
            continue;
        };
        let Some(amount) = cell(row, Some(amount_col)).and_then(parse_amount) else {
            out.summary.skipped_rows += 1;
            continue;
        };
        let date = cell(row, time_col).and_then(parse_date);

        out.summary.net_amount += amount;
        out.transactions.push(Transaction {
            store_id: store_id.clone(),
            platform: Platform::ManagedStore,
            site: None,
            currency: "CNY".to_string(),
            amount,
            transaction_type_raw: fee_item.to_string(),
            is_transfer: is_transfer(fee_item),
            transaction_date: date,
            billing_period: date.map(billing_period).unwrap_or_default(),
            source_file: doc.name.clone(),
            row_number: offset + 2,
        });
        out.summary.parsed_rows += 1;
    }

    out.summary.record_count = out.transactions.len();
    out.summary.currency = Some("CNY".to_string());
    out.summary.billing_period = out
        .transactions
        .iter()
        .find(|t| !t.billing_period.is_empty())
        .map(|t| t.billing_period.clone());

    debug!(file = %doc.name, records = out.summary.record_count, "parsed managed-store ledger");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SheetData;
    use rust_decimal_macros::dec;

    fn ledger() -> SourceDocument {
        let rows = [
            vec!["费用项", "订单号", "结算时间", "金额(CNY)"],
            vec!["供货款", "PO-1", "2025/07/30 08:40:25", "120.00"],
            vec!["售后退款", "PO-2", "2025/07/30 09:00:00", "-15.00"],
            vec!["履约服务费", "PO-1", "2025/07/30 09:10:00", "-6.00"],
            vec!["提现", "", "2025/07/31 10:00:00", "-99.00"],
        ];
        SourceDocument::tabular(
            "天基托管 收支明细_20250701-20250731.xlsx",
            vec![SheetData::new(
                "Sheet1",
                rows.iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect(),
            )],
        )
    }

    #[test]
    fn test_parse_ledger() {
        let parsed = parse(&ledger());
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.transactions.len(), 4);
        assert_eq!(parsed.transactions[0].store_id, "天基托管");
        assert_eq!(parsed.transactions[0].currency, "CNY");
        assert_eq!(parsed.transactions[0].amount, dec!(120.00));
        assert_eq!(parsed.transactions[0].billing_period, "2025-07");
    }

    #[test]
    fn test_withdrawal_is_transfer() {
        let parsed = parse(&ledger());
        let transfer: Vec<_> = parsed
            .transactions
            .iter()
            .filter(|t| t.is_transfer)
            .collect();
        assert_eq!(transfer.len(), 1);
        assert_eq!(transfer[0].transaction_type_raw, "提现");
        assert_eq!(transfer[0].amount, dec!(-99.00));
    }

    #[test]
    fn test_empty_ledger() {
        let doc = SourceDocument::tabular("x 收支明细.xlsx", vec![]);
        let parsed = parse(&doc);
        assert_eq!(parsed.issues[0].kind, IssueKind::EmptyDocument);
    }
}
