//! Source-document parsers for platform and warehouse billing exports
//!
//! One parser per document family, all implementing the same contract:
//! take one document's already-extracted content, return canonical
//! records plus a per-file summary and any document-scoped issues.
//! Low-level byte/cell extraction is the caller's job; the core only
//! ever sees row grids, plain text, and labeled fields.

mod amazon;
mod g7;
mod managed;
mod marketplace_x;
mod shein;
mod temu;
mod warehouse;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{
    DocumentSummary, Issue, Platform, Transaction, WarehouseCost, WarehouseProvider,
};

/// Monetary reconciliation tolerance, in the document's currency units.
/// Stated totals and line-item sums that differ by more than this are a
/// `TotalMismatch`.
pub const RECONCILE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// One extracted sheet: a named raw grid of cells. Single-table sources
/// arrive as one sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// A document as handed over by the extraction layer: a name plus
/// whichever of sheets / plain text / labeled fields the extractor
/// could produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    pub name: String,
    pub sheets: Vec<SheetData>,
    /// Extracted plain text, for scanned documents
    pub text: Option<String>,
    /// Labeled fields from the extractor, e.g. ("Total Amount", "4,770.06")
    pub fields: Vec<(String, String)>,
}

impl SourceDocument {
    pub fn tabular(name: impl Into<String>, sheets: Vec<SheetData>) -> Self {
        Self {
            name: name.into(),
            sheets,
            text: None,
            fields: Vec::new(),
        }
    }

    pub fn text_document(
        name: impl Into<String>,
        text: impl Into<String>,
        fields: Vec<(String, String)>,
    ) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
            text: Some(text.into()),
            fields,
        }
    }

    /// Case-insensitive labeled-field lookup
    pub fn field(&self, label: &str) -> Option<&str> {
        let label = label.to_lowercase();
        self.fields
            .iter()
            .find(|(k, _)| k.to_lowercase() == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.iter().all(|s| s.rows.is_empty())
            && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
            && self.fields.is_empty()
    }
}

/// Result of parsing one platform document
#[derive(Debug, Clone, Default)]
pub struct PlatformParse {
    pub transactions: Vec<Transaction>,
    pub summary: DocumentSummary,
    pub issues: Vec<Issue>,
}

/// Result of parsing one warehouse document
#[derive(Debug, Clone, Default)]
pub struct WarehouseParse {
    pub costs: Vec<WarehouseCost>,
    pub summary: DocumentSummary,
    pub issues: Vec<Issue>,
}

/// Parse a platform billing document into canonical transactions.
pub fn parse_platform(doc: &SourceDocument, platform: Platform) -> PlatformParse {
    match platform {
        Platform::Amazon => amazon::parse(doc),
        Platform::Temu => temu::parse(doc),
        Platform::Shein => shein::parse(doc),
        Platform::ManagedStore => managed::parse(doc),
        Platform::MarketplaceX => marketplace_x::parse(doc),
    }
}

/// Parse a warehouse billing document into canonical cost lines.
pub fn parse_warehouse(doc: &SourceDocument, provider: WarehouseProvider) -> WarehouseParse {
    match provider {
        WarehouseProvider::Tsp => warehouse::parse_tsp(doc),
        WarehouseProvider::Haiyang => warehouse::parse_haiyang(doc),
        WarehouseProvider::Xiyou => warehouse::parse_xiyou(doc),
        WarehouseProvider::G7 => g7::parse(doc),
    }
}

// ---------------------------------------------------------------------
// Shared row helpers
// ---------------------------------------------------------------------

/// Find the index of the first column whose header contains any of the
/// given keys (case-insensitive).
pub(crate) fn find_column(headers: &[String], keys: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.to_lowercase();
        keys.iter().any(|k| h.contains(&k.to_lowercase()))
    })
}

/// Find the column whose header equals any key exactly (case-insensitive,
/// trimmed).
pub(crate) fn find_column_exact(headers: &[String], keys: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().to_lowercase();
        keys.iter().any(|k| h == k.to_lowercase())
    })
}

pub(crate) fn cell<'a>(row: &'a [String], idx: Option<usize>) -> Option<&'a str> {
    let v = row.get(idx?)?.trim();
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Parse a monetary amount, tolerating currency symbols, thousands
/// separators, and accounting-style parentheses.
pub(crate) fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .replace(['$', '£', '€', '￥', '¥', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");
    if cleaned.is_empty() || cleaned == "/" || cleaned == "-" {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Parse a monetary amount in European number format (`1.234,56`),
/// falling back to the standard parser when the text is unambiguous.
pub(crate) fn parse_amount_european(s: &str) -> Option<Decimal> {
    let clean = s.trim();
    let has_dot = clean.contains('.');
    let has_comma = clean.contains(',');
    if has_dot && has_comma && clean.rfind(',') > clean.rfind('.') {
        return parse_amount(&clean.replace('.', "").replace(',', "."));
    }
    if has_comma && !has_dot {
        return parse_amount(&clean.replace(',', "."));
    }
    parse_amount(clean)
}

/// Parse a date (or datetime, keeping the date part) in the formats the
/// supported exports actually use.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m/%d/%y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    None
}

/// Do a line-item sum and a stated total agree within the fixed
/// reconciliation epsilon?
pub(crate) fn totals_match(line_sum: Decimal, stated: Decimal) -> bool {
    (line_sum - stated).abs() <= RECONCILE_EPSILON
}

/// Pull a currency code out of an "All amounts in XXX" statement in
/// extracted body text.
pub(crate) fn currency_statement(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let idx = lower.find("all amounts in ")?;
    let rest = &lower[idx + "all amounts in ".len()..];
    let code: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    if code.len() == 3 {
        Some(code)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount("-123.45"), Some(dec!(-123.45)));
        assert_eq!(parse_amount("(100.00)"), Some(dec!(-100.00)));
        assert_eq!(parse_amount("£56,040.00"), Some(dec!(56040.00)));
        assert_eq!(parse_amount("/"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_parse_amount_preserves_precision() {
        assert_eq!(parse_amount("10.1"), Some(dec!(10.1)));
        assert_eq!(parse_amount("10.100"), Some(dec!(10.100)));
        assert_eq!(parse_amount("0.005"), Some(dec!(0.005)));
    }

    #[test]
    fn test_parse_amount_european() {
        assert_eq!(parse_amount_european("1.234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount_european("17,49"), Some(dec!(17.49)));
        assert_eq!(parse_amount_european("1234.56"), Some(dec!(1234.56)));
    }

    #[test]
    fn test_parse_date() {
        let expect = NaiveDate::from_ymd_opt(2025, 7, 30).unwrap();
        assert_eq!(parse_date("2025-07-30 08:40:25"), Some(expect));
        assert_eq!(parse_date("2025/07/30 08:40:25"), Some(expect));
        assert_eq!(parse_date("2025-07-30"), Some(expect));
        assert_eq!(parse_date("07/30/2025"), Some(expect));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_totals_match() {
        assert!(totals_match(dec!(100.00), dec!(100.01)));
        assert!(totals_match(dec!(100.00), dec!(99.99)));
        assert!(!totals_match(dec!(100.00), dec!(100.02)));
    }

    #[test]
    fn test_currency_statement() {
        assert_eq!(
            currency_statement("Note: All amounts in GBP, unless specified"),
            Some("GBP".to_string())
        );
        assert_eq!(
            currency_statement("all amounts in usd"),
            Some("USD".to_string())
        );
        assert_eq!(currency_statement("amounts in sterling"), None);
    }

    #[test]
    fn test_find_column() {
        let headers = vec![
            "Order ID".to_string(),
            "Total Cost".to_string(),
            "Cost".to_string(),
        ];
        assert_eq!(find_column(&headers, &["total cost"]), Some(1));
        assert_eq!(find_column_exact(&headers, &["cost"]), Some(2));
        assert_eq!(find_column(&headers, &["weight"]), None);
    }

    #[test]
    fn test_document_field_lookup() {
        let doc = SourceDocument::text_document(
            "x.pdf",
            "",
            vec![("Total Amount".to_string(), "4,770.06".to_string())],
        );
        assert_eq!(doc.field("total amount"), Some("4,770.06"));
        assert_eq!(doc.field("missing"), None);
    }
}
