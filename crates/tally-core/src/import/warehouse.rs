//! Warehouse spreadsheet bill parsers: TSP, Haiyang, Xiyou
//!
//! Three layout families, none of which agree on anything:
//!
//! - TSP bills spread line items over several sheets; the "Invoice
//!   Items" sheet totals its sub-charges in a `Total Cost` column that
//!   must be used instead of the per-charge columns to avoid double
//!   counting.
//! - Haiyang bills keep everything in one `CostBill` sheet with a
//!   cascade of candidate amount columns.
//! - Xiyou bills are cover-plus-detail workbooks: only the cover
//!   sheet's stated bill total may be used, because every other sheet
//!   is line-item detail of that same total.
//!
//! None of these layouts carry a usable date column, so the billing
//! month comes from the filename.

use rust_decimal::Decimal;
use tracing::debug;

use super::{cell, find_column, find_column_exact, parse_amount, SourceDocument, WarehouseParse};
use crate::classify::classify_cost;
use crate::filename::{due_date_period, month_token};
use crate::models::{
    DocumentKind, DocumentSummary, Issue, IssueKind, WarehouseCost, WarehouseProvider,
};

fn base_summary(doc: &SourceDocument, provider: WarehouseProvider) -> DocumentSummary {
    DocumentSummary {
        source_file: doc.name.clone(),
        source: provider.to_string(),
        currency: Some(provider.default_currency().to_string()),
        ..Default::default()
    }
}

fn line_item(
    provider: WarehouseProvider,
    doc: &SourceDocument,
    period: &str,
    amount: Decimal,
    raw_type: &str,
    order_id: Option<&str>,
    sku: Option<&str>,
    tracking: Option<&str>,
    row_number: usize,
) -> WarehouseCost {
    WarehouseCost {
        warehouse: provider,
        region: provider.region().to_string(),
        order_id: order_id.map(str::to_string),
        sku: sku.map(str::to_string),
        tracking_number: tracking.map(str::to_string),
        store_id: None,
        amount,
        currency: provider.default_currency().to_string(),
        cost_type: classify_cost(raw_type),
        cost_type_raw: raw_type.to_string(),
        cost_date: None,
        billing_period: period.to_string(),
        document_kind: DocumentKind::Invoice,
        source_file: doc.name.clone(),
        row_number,
    }
}

/// TSP: every sheet contributes line items. The Invoice Items sheet
/// must be summed on `Total Cost` (its per-charge columns would double
/// count); other sheets use their `Cost` column.
pub(super) fn parse_tsp(doc: &SourceDocument) -> WarehouseParse {
    let provider = WarehouseProvider::Tsp;
    let mut out = WarehouseParse {
        summary: base_summary(doc, provider),
        ..Default::default()
    };

    let Some(period) = month_token(&doc.name) else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnparseableFilename,
            "no billing month in filename",
        ));
        return out;
    };
    out.summary.billing_period = Some(period.clone());

    for sheet in &doc.sheets {
        let Some(headers) = sheet.rows.first() else {
            continue;
        };
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let sheet_lower = sheet.name.to_lowercase();

        let cost_col = if sheet_lower.contains("invoice items") && !sheet_lower.contains("additional")
        {
            find_column(&headers, &["total cost"])
        } else {
            find_column_exact(&headers, &["cost"]).or_else(|| {
                headers.iter().position(|h| {
                    let h = h.to_lowercase();
                    h.contains("total") && h.contains("cost")
                })
            })
        };
        let Some(cost_col) = cost_col else {
            continue;
        };

        let desc_col = find_column(&headers, &["description", "charge type", "费用类型", "费用项"]);
        let order_col = find_column(&headers, &["order"]);
        let sku_col = find_column_exact(&headers, &["sku"]);
        let tracking_col = find_column(&headers, &["tracking"]);

        for (offset, row) in sheet.rows[1..].iter().enumerate() {
            out.summary.total_rows += 1;
            let Some(amount) = cell(row, Some(cost_col)).and_then(parse_amount) else {
                out.summary.skipped_rows += 1;
                continue;
            };
            let raw_type = cell(row, desc_col).unwrap_or(&sheet.name);
            out.summary.net_amount += amount;
            out.costs.push(line_item(
                provider,
                doc,
                &period,
                amount,
                raw_type,
                cell(row, order_col),
                cell(row, sku_col),
                cell(row, tracking_col),
                offset + 2,
            ));
            out.summary.parsed_rows += 1;
        }
    }

    if out.costs.is_empty() && out.summary.total_rows == 0 {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::EmptyDocument,
            "no cost columns in any sheet",
        ));
    }

    out.summary.record_count = out.costs.len();
    debug!(file = %doc.name, records = out.summary.record_count, "parsed tsp bill");
    out
}

/// Haiyang: only the `CostBill` sheet counts; sibling sheets duplicate
/// it at other granularities. Amount column priority: 计费规则金额 /
/// 计费金额, then 结算金额, then any 金额 header.
pub(super) fn parse_haiyang(doc: &SourceDocument) -> WarehouseParse {
    let provider = WarehouseProvider::Haiyang;
    let mut out = WarehouseParse {
        summary: base_summary(doc, provider),
        ..Default::default()
    };

    let Some(period) = month_token(&doc.name) else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnparseableFilename,
            "no billing month in filename",
        ));
        return out;
    };
    out.summary.billing_period = Some(period.clone());

    let sheet = doc
        .sheets
        .iter()
        .find(|s| s.name.trim().eq_ignore_ascii_case("costbill"))
        .or_else(|| doc.sheets.first());
    let Some(sheet) = sheet.filter(|s| !s.rows.is_empty()) else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::EmptyDocument,
            "no cost bill sheet",
        ));
        return out;
    };

    let headers: Vec<String> = sheet.rows[0].iter().map(|h| h.trim().to_string()).collect();
    let amount_col = find_column(&headers, &["计费规则金额", "计费金额"])
        .or_else(|| find_column(&headers, &["结算金额"]))
        .or_else(|| find_column(&headers, &["金额"]));
    let Some(amount_col) = amount_col else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnrecognizedDocumentType,
            "no amount column in cost bill",
        ));
        return out;
    };

    let type_col = find_column(&headers, &["费用类型", "费用项", "费用名称"]);
    let order_col = find_column(&headers, &["订单", "order"]);
    let sku_col = find_column_exact(&headers, &["sku"]);
    let tracking_col = find_column(&headers, &["跟踪号", "运单号", "tracking"]);

    for (offset, row) in sheet.rows[1..].iter().enumerate() {
        out.summary.total_rows += 1;
        let Some(amount) = cell(row, Some(amount_col)).and_then(parse_amount) else {
            out.summary.skipped_rows += 1;
            continue;
        };
        let raw_type = cell(row, type_col).unwrap_or_default();
        out.summary.net_amount += amount;
        out.costs.push(line_item(
            provider,
            doc,
            &period,
            amount,
            raw_type,
            cell(row, order_col),
            cell(row, sku_col),
            cell(row, tracking_col),
            offset + 2,
        ));
        out.summary.parsed_rows += 1;
    }

    out.summary.record_count = out.costs.len();
    debug!(file = %doc.name, records = out.summary.record_count, "parsed haiyang bill");
    out
}

/// Cover-cell labels that announce the bill total on a Xiyou cover sheet
const XIYOU_TOTAL_LABELS: &[&str] = &[
    "total bill amount",
    "账单总计",
    "账单小计",
    "账单合计",
];

/// Xiyou: document-level granularity. Only the cover sheet's stated
/// total is read; summing the detail sheets would double count it.
pub(super) fn parse_xiyou(doc: &SourceDocument) -> WarehouseParse {
    let provider = WarehouseProvider::Xiyou;
    let mut out = WarehouseParse {
        summary: base_summary(doc, provider),
        ..Default::default()
    };

    let Some(period) = due_date_period(&doc.name).or_else(|| month_token(&doc.name)) else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnparseableFilename,
            "no due-date or month token in filename",
        ));
        return out;
    };
    out.summary.billing_period = Some(period.clone());

    let Some(cover) = doc.sheets.first().filter(|s| !s.rows.is_empty()) else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::EmptyDocument,
            "no cover sheet",
        ));
        return out;
    };

    for (r, row) in cover.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let lower = value.trim().to_lowercase();
            if !XIYOU_TOTAL_LABELS.iter().any(|k| lower.contains(k)) {
                continue;
            }
            // first parseable value to the right of the label
            if let Some(amount) = row[c + 1..].iter().find_map(|v| parse_amount(v)) {
                out.summary.total_rows = 1;
                out.summary.parsed_rows = 1;
                out.summary.net_amount = amount;
                out.costs.push(line_item(
                    provider,
                    doc,
                    &period,
                    amount,
                    value.trim(),
                    None,
                    None,
                    None,
                    r + 1,
                ));
                out.summary.record_count = 1;
                debug!(file = %doc.name, %amount, "parsed xiyou cover total");
                return out;
            }
        }
    }

    // cover labels absent or valueless: returning zero records beats
    // mistaking detail rows for a second copy of the total
    out.issues.push(Issue::new(
        &doc.name,
        IssueKind::EmptyDocument,
        "no stated bill total on cover sheet",
    ));
    out
}
