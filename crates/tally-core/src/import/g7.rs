//! G7 scanned-invoice parser
//!
//! G7 bills arrive as scanned PDFs with no extractable line items, so
//! each document becomes a single document-level cost record. All the
//! structure lives in the filename: the leading digit run encodes the
//! billing date, and suffixes distinguish invoices from credit notes
//! and from appendix detail documents.
//!
//! Appendix documents are excluded entirely — their sibling invoice
//! already states the total, and counting both would double the month.
//! The stated total is sign-normalized exactly once from the document
//! type: invoices positive, credit notes negative, whatever sign the
//! scan happens to print.

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;
use tracing::debug;

use super::{currency_statement, parse_amount, SourceDocument, WarehouseParse};
use crate::classify::classify_cost;
use crate::filename::{billing_period, filename_kind, sequence_date, FilenameKind};
use crate::models::{
    DocumentKind, DocumentSummary, Issue, IssueKind, WarehouseCost, WarehouseProvider,
};

/// `Total Amount: 4,770.06` (or `Total Amount 4,770.06`) in scanned text
fn total_from_text(text: &str) -> Option<Decimal> {
    static TOTAL: OnceLock<Regex> = OnceLock::new();
    let re = TOTAL.get_or_init(|| {
        Regex::new(r"(?i)total\s+amount\s*[:：]?\s*(-?[\d,]+(?:\.\d+)?)").expect("hardcoded regex")
    });
    re.captures(text).and_then(|c| parse_amount(&c[1]))
}

pub(super) fn parse(doc: &SourceDocument) -> WarehouseParse {
    let provider = WarehouseProvider::G7;
    let mut out = WarehouseParse {
        summary: DocumentSummary {
            source_file: doc.name.clone(),
            source: provider.to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let kind = match filename_kind(&doc.name) {
        FilenameKind::Appendix => {
            // detail companion of an invoice already counted
            debug!(file = %doc.name, "appendix document excluded");
            return out;
        }
        FilenameKind::Invoice => DocumentKind::Invoice,
        FilenameKind::CreditNote => DocumentKind::CreditNote,
    };

    let Some(seq) = sequence_date(&doc.name) else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnparseableFilename,
            "no date-bearing digit run in filename",
        ));
        return out;
    };

    if doc.is_empty() {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::EmptyDocument,
            "no extracted text or fields",
        ));
        return out;
    }

    let stated = doc
        .field("total amount")
        .and_then(parse_amount)
        .or_else(|| doc.text.as_deref().and_then(total_from_text));
    let Some(stated) = stated else {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::UnrecognizedDocumentType,
            "no Total Amount field in extracted content",
        ));
        return out;
    };

    // normalize once from the document type, ignoring the printed sign
    let amount = match kind {
        DocumentKind::Invoice => stated.abs(),
        DocumentKind::CreditNote => -stated.abs(),
    };

    let currency = doc
        .field("currency")
        .map(|c| c.trim().to_uppercase())
        .or_else(|| doc.text.as_deref().and_then(currency_statement))
        .unwrap_or_else(|| provider.default_currency().to_string());

    let raw_type = doc
        .field("description")
        .or_else(|| doc.field("service"))
        .unwrap_or_default();

    let period = billing_period(seq.date);
    out.costs.push(WarehouseCost {
        warehouse: provider,
        region: provider.region().to_string(),
        order_id: None,
        sku: None,
        tracking_number: None,
        store_id: None,
        amount,
        currency: currency.clone(),
        cost_type: classify_cost(raw_type),
        cost_type_raw: raw_type.to_string(),
        cost_date: Some(seq.date),
        billing_period: period.clone(),
        document_kind: kind,
        source_file: doc.name.clone(),
        row_number: 1,
    });

    out.summary.total_rows = 1;
    out.summary.parsed_rows = 1;
    out.summary.record_count = 1;
    out.summary.net_amount = amount;
    out.summary.billing_period = Some(period);
    out.summary.currency = Some(currency);

    debug!(
        file = %doc.name,
        kind = %kind,
        %amount,
        "parsed g7 document"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn text_doc(name: &str, text: &str) -> SourceDocument {
        SourceDocument::text_document(name, text, vec![])
    }

    #[test]
    fn test_invoice_from_labeled_field() {
        let doc = SourceDocument::text_document(
            "702510206R.pdf",
            "G7 FULFILMENT SERVICES\n...",
            vec![("Total Amount".to_string(), "4,770.06".to_string())],
        );
        let parsed = parse(&doc);
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.costs.len(), 1);
        let c = &parsed.costs[0];
        assert_eq!(c.amount, dec!(4770.06));
        assert_eq!(c.currency, "USD");
        assert_eq!(c.billing_period, "2025-10");
        assert_eq!(c.document_kind, DocumentKind::Invoice);
    }

    #[test]
    fn test_total_from_body_text() {
        let doc = text_doc(
            "702510206R.pdf",
            "Service period Oct 2025\nTotal Amount: 4,770.06\nThank you",
        );
        let parsed = parse(&doc);
        assert_eq!(parsed.costs[0].amount, dec!(4770.06));
    }

    #[test]
    fn test_credit_note_negated() {
        // printed positive, must come out negative
        let doc = text_doc("702510207_CREDIT.pdf", "Total Amount: 56,040.00");
        let parsed = parse(&doc);
        assert_eq!(parsed.costs[0].amount, dec!(-56040.00));
        assert_eq!(parsed.costs[0].document_kind, DocumentKind::CreditNote);
    }

    #[test]
    fn test_credit_note_no_double_negation() {
        // already negative, stays negative
        let doc = text_doc("702510207_CREDIT.pdf", "Total Amount: -56,040.00");
        let parsed = parse(&doc);
        assert_eq!(parsed.costs[0].amount, dec!(-56040.00));
    }

    #[test]
    fn test_appendix_excluded() {
        let doc = text_doc("702510206R_Appendix.pdf", "Total Amount: 4,770.06");
        let parsed = parse(&doc);
        assert!(parsed.costs.is_empty());
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn test_unparseable_filename() {
        let doc = text_doc("702513206R.pdf", "Total Amount: 10.00");
        let parsed = parse(&doc);
        assert!(parsed.costs.is_empty());
        assert_eq!(parsed.issues[0].kind, IssueKind::UnparseableFilename);
    }

    #[test]
    fn test_missing_total() {
        let doc = text_doc("702510206R.pdf", "nothing useful here");
        let parsed = parse(&doc);
        assert!(parsed.costs.is_empty());
        assert_eq!(parsed.issues[0].kind, IssueKind::UnrecognizedDocumentType);
    }

    #[test]
    fn test_currency_from_statement() {
        let doc = text_doc(
            "702510206R.pdf",
            "All amounts in GBP\nTotal Amount: 100.00",
        );
        let parsed = parse(&doc);
        assert_eq!(parsed.costs[0].currency, "GBP");
    }
}
