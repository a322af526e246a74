//! Temu fund-detail workbook parser
//!
//! A `FundDetail` export is a multi-sheet workbook where the sheet name
//! carries the semantic type and sign of its rows: settlement income is
//! positive, refunds and deductions negative. Unknown sheets are
//! skipped. Longest-prefix matching keeps the bare `结算` sheet from
//! swallowing the more specific `结算-售后退款` ones.

use tracing::debug;

use super::{cell, find_column_exact, parse_amount, parse_date, PlatformParse, SourceDocument};
use crate::filename::billing_period;
use crate::models::{DocumentSummary, Issue, IssueKind, Platform, Transaction};

/// Sheet-name prefix -> (raw type label, sign). Order does not matter;
/// the longest matching prefix wins.
const SHEET_TYPES: &[(&str, i8)] = &[
    ("结算-交易收入", 1),
    ("结算-售后退款", -1),
    ("结算-运费收入", 1),
    ("结算-运费退款", -1),
    ("支出-履约违规", -1),
    ("支出-技术服务费", -1),
    ("结算", 1),
];

const AMOUNT_COLUMNS: &[&str] = &[
    "交易收入",
    "退款金额",
    "运费收入",
    "运费退款",
    "违规金额",
    "扣款金额",
    "结算金额",
];

fn sheet_sign(sheet_name: &str) -> Option<(String, i8)> {
    SHEET_TYPES
        .iter()
        .filter(|(prefix, _)| sheet_name.contains(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(prefix, sign)| (prefix.to_string(), *sign))
}

fn store_name(filename: &str) -> String {
    let lower = filename.to_lowercase();
    if let Some(idx) = lower.find("funddetail") {
        let prefix = filename[..idx].trim().trim_end_matches('-').trim();
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
            source: Platform::Temu.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    if doc.is_empty() {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::EmptyDocument,
            "no extracted content",
        ));
        return out;
    }

    let store = store_name(&doc.name);
    let store_id = store.to_lowercase().replace(' ', "_");

    // currency is filled per row where the sheet has a 币种 column;
    // rows without one inherit the document-level value afterwards
    let mut pending: Vec<(Transaction, bool)> = Vec::new();
    let mut document_currency: Option<String> = None;

    for sheet in &doc.sheets {
        let Some((type_label, sign)) = sheet_sign(&sheet.name) else {
            debug!(file = %doc.name, sheet = %sheet.name, "skipping unknown sheet");
            continue;
        };
        let Some(headers) = sheet.rows.first() else {
            continue;
        };
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let amount_col = find_column_exact(&headers, AMOUNT_COLUMNS).or_else(|| {
            // any column that holds parseable amounts, as a fallback
            sheet.rows.get(1).and_then(|row| {
                row.iter()
                    .position(|v| parse_amount(v).is_some())
            })
        });
        let Some(amount_col) = amount_col else {
            out.issues.push(Issue::new(
                &doc.name,
                IssueKind::UnrecognizedDocumentType,
                format!("sheet {} has no amount column", sheet.name),
            ));
            continue;
        };

        let currency_col = find_column_exact(&headers, &["币种"]);
        let time_col = find_column_exact(&headers, &["账务时间", "时间"]);
        let order_col = find_column_exact(&headers, &["订单编号"]);

        for (offset, row) in sheet.rows[1..].iter().enumerate() {
            out.summary.total_rows += 1;
            let Some(raw_amount) = cell(row, Some(amount_col)) else {
                out.summary.skipped_rows += 1;
                continue;
            };
            let Some(amount) = parse_amount(raw_amount) else {
                out.summary.skipped_rows += 1;
                continue;
            };
            let amount = if sign < 0 { -amount.abs() } else { amount };

            let currency = cell(row, currency_col).map(|c| c.to_uppercase());
            if let Some(c) = &currency {
                document_currency.get_or_insert_with(|| c.clone());
            }

            let date = cell(row, time_col).and_then(parse_date);
            let period = date.map(billing_period).unwrap_or_default();

            let txn = Transaction {
                store_id: store_id.clone(),
                platform: Platform::Temu,
                site: None,
                currency: currency.clone().unwrap_or_default(),
                amount,
                transaction_type_raw: type_label.clone(),
                is_transfer: false,
                transaction_date: date,
                billing_period: period,
                source_file: doc.name.clone(),
                row_number: offset + 2,
            };
            pending.push((txn, currency.is_some()));
            out.summary.parsed_rows += 1;
        }
    }

    // Temu states currency in the body, never in the filename; a
    // document where no sheet carried one cannot be attributed.
    let Some(document_currency) = document_currency else {
        if !pending.is_empty() || out.summary.total_rows > 0 {
            out.issues.push(Issue::new(
                &doc.name,
                IssueKind::MissingCurrency,
                "no 币种 column in any settlement sheet",
            ));
        } else {
            out.issues.push(Issue::new(
                &doc.name,
                IssueKind::EmptyDocument,
                "no settlement rows",
            ));
        }
        return out;
    };

    for (mut txn, had_currency) in pending {
        if !had_currency {
            txn.currency = document_currency.clone();
        }
        out.summary.net_amount += txn.amount;
        out.transactions.push(txn);
    }

    out.summary.record_count = out.transactions.len();
    out.summary.currency = Some(document_currency);
    out.summary.billing_period = out
        .transactions
        .iter()
        .find(|t| !t.billing_period.is_empty())
        .map(|t| t.billing_period.clone());

    debug!(
        file = %doc.name,
        records = out.summary.record_count,
        "parsed temu fund detail"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SheetData;
    use rust_decimal_macros::dec;

    fn sheet(name: &str, rows: &[&[&str]]) -> SheetData {
        SheetData::new(
            name,
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn fund_detail() -> SourceDocument {
        SourceDocument::tabular(
            "All F Home FundDetail-1754358591792-f173.xlsx",
            vec![
                sheet(
                    "结算-交易收入",
                    &[
                        &["订单编号", "账务时间", "币种", "交易收入"],
                        &["PO-1", "2025-07-03 10:21:09", "USD", "55.20"],
                        &["PO-2", "2025-07-04 08:00:00", "USD", "12.80"],
                    ],
                ),
                sheet(
                    "结算-售后退款",
                    &[
                        &["订单编号", "账务时间", "币种", "退款金额"],
                        &["PO-1", "2025-07-10 16:40:00", "USD", "8.00"],
                    ],
                ),
                sheet(
                    "未知说明",
                    &[&["说明"], &["本表为说明页"]],
                ),
            ],
        )
    }

    #[test]
    fn test_parse_sheets_with_signs() {
        let parsed = parse(&fund_detail());
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.transactions.len(), 3);
        // refund sheet flips the printed sign
        assert_eq!(parsed.transactions[2].amount, dec!(-8.00));
        assert_eq!(parsed.summary.net_amount, dec!(60.00));
        assert_eq!(parsed.summary.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_store_name_from_filename() {
        let parsed = parse(&fund_detail());
        assert_eq!(parsed.transactions[0].store_id, "all_f_home");
        assert_eq!(parsed.transactions[0].billing_period, "2025-07");
    }

    #[test]
    fn test_longest_prefix_wins() {
        assert_eq!(sheet_sign("结算-售后退款").unwrap().1, -1);
        assert_eq!(sheet_sign("结算").unwrap().1, 1);
        assert!(sheet_sign("其他说明").is_none());
    }

    #[test]
    fn test_missing_currency() {
        let doc = SourceDocument::tabular(
            "Store FundDetail-1.xlsx",
            vec![sheet(
                "结算-交易收入",
                &[&["订单编号", "交易收入"], &["PO-1", "10.00"]],
            )],
        );
        let parsed = parse(&doc);
        assert!(parsed.transactions.is_empty());
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind, IssueKind::MissingCurrency);
    }

    #[test]
    fn test_skips_slash_amounts() {
        let doc = SourceDocument::tabular(
            "Store FundDetail-1.xlsx",
            vec![sheet(
                "结算-交易收入",
                &[
                    &["订单编号", "币种", "交易收入"],
                    &["PO-1", "USD", "/"],
                    &["PO-2", "USD", "30.00"],
                ],
            )],
        );
        let parsed = parse(&doc);
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.summary.skipped_rows, 1);
        assert_eq!(parsed.transactions[0].amount, dec!(30.00));
    }
}
