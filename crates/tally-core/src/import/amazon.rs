//! Amazon monthly transaction export parser
//!
//! Amazon settlement CSVs arrive in several languages with localized
//! column names, a preamble above the header row, and locale-dependent
//! number formats. The parser detects the header row and language from
//! marker columns, maps localized headers onto canonical fields, and
//! verifies each row's stated total against the sum of its component
//! columns.
//!
//! Site and currency resolution order: filename token, then an
//! "All amounts in XXX" statement in the preamble, then a currency
//! column, then the language default (de -> DE/EUR, fr -> FR/EUR,
//! jp -> JP/JPY, en -> US/USD).

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::{
    cell, currency_statement, find_column_exact, parse_amount, parse_amount_european, parse_date,
    totals_match, PlatformParse, SourceDocument,
};
use crate::classify::is_transfer;
use crate::filename::{billing_period, site_currency, site_token, KNOWN_SITES};
use crate::models::{DocumentSummary, Issue, IssueKind, Platform, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lang {
    En,
    De,
    Fr,
    Jp,
}

/// Marker columns that identify a header row and its language
const LANG_MARKERS: &[(Lang, &[&str])] = &[
    (Lang::En, &["type", "product sales", "total"]),
    (Lang::De, &["typ", "umsätze", "gesamt"]),
    (Lang::Fr, &["type", "ventes de produits", "total"]),
    (Lang::Jp, &["トランザクションの種類", "商品の売上", "合計"]),
];

/// Localized headers for the numeric columns, `[en, de, fr, jp]`.
/// The last entry is the stated row total; everything before it is a
/// component that must sum to it.
const NUMERIC_COLUMNS: &[[&str; 4]] = &[
    ["product sales", "umsätze", "ventes de produits", "商品の売上"],
    [
        "product sales tax",
        "produktumsatzsteuer",
        "taxe sur les ventes de produits",
        "商品の売上税",
    ],
    [
        "postage credits",
        "gutschrift für versandkosten",
        "crédits d'expédition",
        "配送料",
    ],
    [
        "postage credits tax",
        "steuer auf versandgutschrift",
        "taxe sur les crédits d'expédition",
        "配送料金にかかる税金",
    ],
    [
        "shipping credits",
        "gutschrift für versandkosten",
        "crédits d'expédition",
        "配送料",
    ],
    [
        "shipping credits tax",
        "steuer auf versandgutschrift",
        "taxe sur les crédits d'expédition",
        "配送料金にかかる税金",
    ],
    [
        "gift wrap credits",
        "gutschrift für geschenkverpackung",
        "crédits cadeau",
        "ギフト包装手数料",
    ],
    [
        "giftwrap credits tax",
        "steuer auf geschenkverpackungsgutschriften",
        "taxe sur les crédits cadeau",
        "ギフト包装料にかかる税金",
    ],
    [
        "promotional rebates",
        "rabatte aus werbeaktionen",
        "rabais promotionnels",
        "プロモーション割引額",
    ],
    [
        "promotional rebates tax",
        "steuer auf aktionsrabatte",
        "taxe sur les rabais promotionnels",
        "プロモーション割引の税金",
    ],
    [
        "marketplace withheld tax",
        "einbehaltene steuer auf marketplace",
        "taxe retenue par le site de vente",
        "源泉徴収税",
    ],
    ["selling fees", "verkaufsgebühren", "frais de vente", "手数料"],
    [
        "fba fees",
        "gebühren zu versand durch amazon",
        "frais expédié par amazon",
        "fba 手数料",
    ],
    [
        "other transaction fees",
        "andere transaktionsgebühren",
        "autres frais de transaction",
        "トランザクションに関するその他の手数料",
    ],
    ["other", "andere", "divers", "その他"],
    ["total", "gesamt", "total", "合計"],
];

const TOTAL_IDX: usize = NUMERIC_COLUMNS.len() - 1;

const DATE_COLUMN: [&str; 4] = ["date/time", "datum/uhrzeit", "date/heure", "日付/時間"];
const TYPE_COLUMN: [&str; 4] = ["type", "typ", "type", "トランザクションの種類"];
const ORDER_COLUMN: [&str; 4] = [
    "order id",
    "bestellnummer",
    "numéro de la commande",
    "注文番号",
];
const SETTLEMENT_COLUMN: [&str; 4] = [
    "settlement id",
    "abrechnungsnummer",
    "numéro de règlement",
    "決済番号",
];

fn lang_idx(lang: Lang) -> usize {
    match lang {
        Lang::En => 0,
        Lang::De => 1,
        Lang::Fr => 2,
        Lang::Jp => 3,
    }
}

/// Localized column lookup with English fallback
fn localized_column(headers: &[String], names: &[&str; 4], lang: Lang) -> Option<usize> {
    find_column_exact(headers, &[names[lang_idx(lang)]])
        .or_else(|| find_column_exact(headers, &[names[0]]))
}

/// Scan the first rows of the sheet for a header row carrying all
/// marker columns of one language.
fn detect_header_and_lang(rows: &[Vec<String>]) -> Option<(usize, Lang)> {
    for (i, row) in rows.iter().take(50).enumerate() {
        let joined = row.join(",").to_lowercase();
        for (lang, markers) in LANG_MARKERS {
            if markers.iter().all(|m| joined.contains(m)) {
                return Some((i, *lang));
            }
        }
    }
    None
}

/// Translate a localized transaction-type value to its canonical
/// English word so the transfer filter sees a single vocabulary.
fn translate_type(value: &str, lang: Lang) -> String {
    if lang == Lang::En {
        return value.to_string();
    }
    let lower = value.to_lowercase();
    let translated = match lang {
        Lang::De => {
            if lower.contains("bestellung") {
                Some("Order")
            } else if lower.contains("erstattung") {
                Some("Refund")
            } else if lower.contains("übertrag") || lower.contains("transfer") {
                Some("Transfer")
            } else if lower.contains("servicegebühr") {
                Some("Service Fee")
            } else if lower.contains("anpassung") {
                Some("Adjustment")
            } else {
                None
            }
        }
        Lang::Fr => {
            if lower.contains("commande") {
                Some("Order")
            } else if lower.contains("remboursement") {
                Some("Refund")
            } else if lower.contains("transfert") {
                Some("Transfer")
            } else if lower.contains("frais de service") {
                Some("Service Fee")
            } else if lower.contains("ajustement") {
                Some("Adjustment")
            } else {
                None
            }
        }
        Lang::Jp => {
            if lower.contains("注文") {
                Some("Order")
            } else if lower.contains("返金") {
                Some("Refund")
            } else if lower.contains("振込") || lower.contains("送金") {
                Some("Transfer")
            } else if lower.contains("サービス料") {
                Some("Service Fee")
            } else if lower.contains("調整") {
                Some("Adjustment")
            } else {
                None
            }
        }
        Lang::En => None,
    };
    translated.map(|t| t.to_string()).unwrap_or_else(|| value.to_string())
}

fn parse_localized_amount(s: &str, lang: Lang) -> Option<Decimal> {
    match lang {
        Lang::De | Lang::Fr => parse_amount_european(s),
        _ => parse_amount(s),
    }
}

/// Billing month from the `2025Nov`-style filename token
fn filename_period(name: &str) -> Option<String> {
    const MONTHS: &[(&str, u32)] = &[
        ("jan", 1),
        ("feb", 2),
        ("mar", 3),
        ("apr", 4),
        ("may", 5),
        ("jun", 6),
        ("jul", 7),
        ("aug", 8),
        ("sep", 9),
        ("oct", 10),
        ("nov", 11),
        ("dec", 12),
    ];
    let lower = name.to_lowercase();
    let bytes = lower.as_bytes();
    for i in 0..bytes.len().saturating_sub(6) {
        let window = &bytes[i..i + 7];
        if window[..4].iter().all(|b| b.is_ascii_digit())
            && window[4..].iter().all(|b| b.is_ascii_alphabetic())
        {
            let year = std::str::from_utf8(&window[..4]).ok()?;
            let abbr = std::str::from_utf8(&window[4..]).ok()?;
            if let Some((_, m)) = MONTHS.iter().find(|(a, _)| *a == abbr) {
                return Some(format!("{}-{:02}", year, m));
            }
        }
    }
    None
}

pub(super) fn parse(doc: &SourceDocument) -> PlatformParse {
    let mut out = PlatformParse {
        summary: DocumentSummary {
            source_file: doc.name.clone(),
            source: Platform::Amazon.to_string(),
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

    let (header_idx, lang) = match detect_header_and_lang(rows) {
        Some(found) => found,
        None => {
            out.issues.push(Issue::new(
                &doc.name,
                IssueKind::UnrecognizedDocumentType,
                "no transaction header row found (en/de/fr/jp)",
            ));
            return out;
        }
    };

    let headers: Vec<String> = rows[header_idx].iter().map(|h| h.trim().to_string()).collect();

    // Site and currency resolution chain
    let token = site_token(&doc.name);
    let mut site = token.as_ref().map(|t| t.site.clone());
    let store_name = token
        .as_ref()
        .map(|t| t.store.clone())
        .unwrap_or_else(|| doc.name.split('.').next().unwrap_or(&doc.name).to_string());

    let preamble = rows[..header_idx]
        .iter()
        .map(|r| r.join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    let mut currency = site.as_deref().and_then(site_currency).map(str::to_string);
    if currency.is_none() {
        if let Some(code) = currency_statement(&preamble) {
            site = site.or_else(|| {
                KNOWN_SITES
                    .iter()
                    .find(|s| site_currency(s) == Some(code.as_str()))
                    .map(|s| s.to_string())
            });
            currency = Some(code);
        }
    }

    let currency_col = super::find_column(
        &headers,
        &["currency", "währung", "devise", "通貨"],
    );
    if currency.is_none() {
        if let Some(idx) = currency_col {
            if let Some(code) = rows.get(header_idx + 1).and_then(|r| cell(r, Some(idx))) {
                let code = code.to_uppercase();
                if ["USD", "GBP", "EUR", "CAD", "JPY", "AUD"].contains(&code.as_str()) {
                    currency = Some(code);
                }
            }
        }
    }

    let settlement_col = localized_column(&headers, &SETTLEMENT_COLUMN, lang);
    if site.is_none() {
        if let Some(idx) = settlement_col {
            if let Some(value) = rows.get(header_idx + 1).and_then(|r| cell(r, Some(idx))) {
                let upper = value.to_uppercase();
                site = KNOWN_SITES
                    .iter()
                    .find(|s| {
                        upper.starts_with(&format!("{}-", s))
                            || upper.starts_with(&format!("{}_", s))
                            || upper.contains(&format!("-{}-", s))
                    })
                    .map(|s| s.to_string());
            }
        }
    }

    // Language default closes the chain, so Amazon documents always
    // resolve a currency.
    if currency.is_none() || site.is_none() {
        let (default_site, default_currency) = match lang {
            Lang::De => ("DE", "EUR"),
            Lang::Fr => ("FR", "EUR"),
            Lang::Jp => ("JP", "JPY"),
            Lang::En => ("US", "USD"),
        };
        if site.is_none() && token.is_none() {
            site = Some(default_site.to_string());
        }
        currency = currency.or_else(|| Some(default_currency.to_string()));
    }
    let currency = currency.unwrap_or_else(|| "USD".to_string());

    if site.is_none() {
        out.issues.push(Issue::new(
            &doc.name,
            IssueKind::MissingSite,
            "site could not be resolved from filename or content",
        ));
    }

    let store_id = match &site {
        Some(s) => format!("{}_{}", store_name, s).to_lowercase().replace(' ', "_"),
        None => store_name.to_lowercase().replace(' ', "_"),
    };

    // One column feeds at most one field; when a language reuses a
    // header (de shipping/postage credits) the later field wins, as a
    // plain col -> field map naturally encodes.
    let mut numeric_for_col: HashMap<usize, usize> = HashMap::new();
    for (field, names) in NUMERIC_COLUMNS.iter().enumerate() {
        if let Some(col) = localized_column(&headers, names, lang) {
            numeric_for_col.insert(col, field);
        }
    }
    let date_col = localized_column(&headers, &DATE_COLUMN, lang);
    let type_col = localized_column(&headers, &TYPE_COLUMN, lang);
    let order_col = localized_column(&headers, &ORDER_COLUMN, lang);

    let doc_period = filename_period(&doc.name);

    for (offset, row) in rows[header_idx + 1..].iter().enumerate() {
        let row_number = header_idx + 2 + offset;
        out.summary.total_rows += 1;

        if row.iter().all(|c| c.trim().is_empty()) {
            out.summary.skipped_rows += 1;
            continue;
        }

        let mut numeric = vec![Decimal::ZERO; NUMERIC_COLUMNS.len()];
        for (&col, &field) in &numeric_for_col {
            if let Some(v) = cell(row, Some(col)) {
                if let Some(amount) = parse_localized_amount(v, lang) {
                    numeric[field] = amount;
                }
            }
        }

        let total = numeric[TOTAL_IDX];
        let components: Decimal = numeric[..TOTAL_IDX].iter().copied().sum();
        if totals_match(components, total) {
            out.summary.verified_rows += 1;
        } else {
            out.summary.mismatched_rows += 1;
        }

        let type_raw = cell(row, type_col).unwrap_or_default().to_string();
        let translated = translate_type(&type_raw, lang);
        let order_id = cell(row, order_col).unwrap_or_default();
        // Transfer rows sometimes carry a blank type; the description
        // convention from the source ledgers is order-less rows.
        let transfer = is_transfer(&translated)
            || (order_id.is_empty() && is_transfer(&type_raw));

        let date = cell(row, date_col).and_then(parse_date);
        let period = date
            .map(billing_period)
            .or_else(|| doc_period.clone())
            .unwrap_or_default();

        out.transactions.push(Transaction {
            store_id: store_id.clone(),
            platform: Platform::Amazon,
            site: site.clone(),
            currency: currency.clone(),
            amount: total,
            transaction_type_raw: type_raw,
            is_transfer: transfer,
            transaction_date: date,
            billing_period: period,
            source_file: doc.name.clone(),
            row_number,
        });
        out.summary.parsed_rows += 1;
        out.summary.net_amount += total;
    }

    out.summary.record_count = out.transactions.len();
    out.summary.billing_period = doc_period.or_else(|| {
        out.transactions
            .iter()
            .find(|t| !t.billing_period.is_empty())
            .map(|t| t.billing_period.clone())
    });
    out.summary.currency = Some(currency);
    out.summary.site = site;

    debug!(
        file = %doc.name,
        rows = out.summary.parsed_rows,
        mismatched = out.summary.mismatched_rows,
        "parsed amazon export"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SheetData;
    use rust_decimal_macros::dec;

    fn grid(csv: &str) -> Vec<Vec<String>> {
        csv.lines()
            .map(|l| l.split('\t').map(|c| c.to_string()).collect())
            .collect()
    }

    fn en_doc(name: &str, body_rows: &str) -> SourceDocument {
        let header = "date/time\tsettlement id\ttype\torder id\tsku\tdescription\tproduct sales\tproduct sales tax\tpostage credits\tpostage credits tax\tshipping credits\tshipping credits tax\tgift wrap credits\tgiftwrap credits tax\tpromotional rebates\tpromotional rebates tax\tmarketplace withheld tax\tselling fees\tfba fees\tother transaction fees\tother\ttotal";
        let csv = format!(
            "Includes Amazon Marketplace transactions\nAll amounts in GBP, unless specified\n{}\n{}",
            header, body_rows
        );
        SourceDocument::tabular(name, vec![SheetData::new("Sheet1", grid(&csv))])
    }

    #[test]
    fn test_parse_basic_rows() {
        let doc = en_doc(
            "store5-UK 2025JulMonthlyTransaction.csv",
            "2025-07-03 10:00:00\t12345\tOrder\t202-1\tSKU1\tWidget\t20.00\t0\t3.99\t0\t0\t0\t0\t0\t-2.00\t0\t0\t-4.40\t-3.10\t0\t0\t14.49\n\
             2025-07-09 11:00:00\t12345\tRefund\t202-2\tSKU1\tWidget\t-20.00\t0\t0\t0\t0\t0\t0\t0\t2.00\t0\t0\t4.40\t0\t0\t0\t-13.60",
        );
        let parsed = parse(&doc);
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.transactions.len(), 2);

        let t = &parsed.transactions[0];
        assert_eq!(t.amount, dec!(14.49));
        assert_eq!(t.currency, "GBP");
        assert_eq!(t.site.as_deref(), Some("UK"));
        assert_eq!(t.billing_period, "2025-07");
        assert!(!t.is_transfer);
        assert_eq!(parsed.summary.verified_rows, 2);
        assert_eq!(parsed.summary.mismatched_rows, 0);
        assert_eq!(parsed.summary.net_amount, dec!(0.89));
    }

    #[test]
    fn test_transfer_row_annotated() {
        let doc = en_doc(
            "store5-UK 2025JulMonthlyTransaction.csv",
            "2025-07-31 09:00:00\t12345\tTransfer\t\t\tTransfer to bank account\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t-500.00",
        );
        let parsed = parse(&doc);
        assert_eq!(parsed.transactions.len(), 1);
        assert!(parsed.transactions[0].is_transfer);
        // a transfer total has no component columns, so it does not verify
        assert_eq!(parsed.summary.mismatched_rows, 1);
    }

    #[test]
    fn test_currency_from_body_statement() {
        // no site token in the filename: body statement decides
        let doc = en_doc("2025JulMonthlyUnifiedTransaction.csv",
            "2025-07-03 10:00:00\t12345\tOrder\t202-1\tSKU1\tWidget\t10.00\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t10.00");
        let parsed = parse(&doc);
        assert_eq!(parsed.summary.currency.as_deref(), Some("GBP"));
        assert_eq!(parsed.summary.site.as_deref(), Some("UK"));
    }

    #[test]
    fn test_german_export() {
        let header = "datum/uhrzeit\tabrechnungsnummer\ttyp\tbestellnummer\tsku\tbeschreibung\tumsätze\tverkaufsgebühren\tgesamt";
        let csv = format!(
            "Es gelten die folgenden Hinweise\n{}\n03.07.2025? no\t777\tBestellung\t028-1\tSKU9\tDing\t17,49\t-3,00\t14,49",
            header
        );
        let doc = SourceDocument::tabular(
            "2025JulMonthlyTransaction.csv",
            vec![SheetData::new("Sheet1", grid(&csv))],
        );
        let parsed = parse(&doc);
        assert_eq!(parsed.transactions.len(), 1);
        let t = &parsed.transactions[0];
        // european decimal comma
        assert_eq!(t.amount, dec!(14.49));
        // language default closes the resolution chain
        assert_eq!(t.currency, "EUR");
        assert_eq!(t.site.as_deref(), Some("DE"));
        assert!(!t.is_transfer);
    }

    #[test]
    fn test_german_transfer_translated() {
        let header = "datum/uhrzeit\ttyp\tgesamt";
        let csv = format!("{}\n2025-07-31 09:00:00\tÜbertrag auf Bankkonto\t-250,00", header);
        let doc = SourceDocument::tabular(
            "de-store 2025Jul.csv",
            vec![SheetData::new("Sheet1", grid(&csv))],
        );
        let parsed = parse(&doc);
        assert_eq!(parsed.transactions.len(), 1);
        assert!(parsed.transactions[0].is_transfer);
        assert_eq!(parsed.transactions[0].amount, dec!(-250.00));
    }

    #[test]
    fn test_no_header_row() {
        let doc = SourceDocument::tabular(
            "garbage.csv",
            vec![SheetData::new("Sheet1", grid("just\tsome\tcells"))],
        );
        let parsed = parse(&doc);
        assert!(parsed.transactions.is_empty());
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind, IssueKind::UnrecognizedDocumentType);
    }

    #[test]
    fn test_empty_document() {
        let doc = SourceDocument::tabular("empty.csv", vec![]);
        let parsed = parse(&doc);
        assert_eq!(parsed.issues[0].kind, IssueKind::EmptyDocument);
    }

    #[test]
    fn test_filename_period() {
        assert_eq!(
            filename_period("2025NovMonthlyTransaction.csv").as_deref(),
            Some("2025-11")
        );
        assert_eq!(filename_period("nothing.csv"), None);
    }
}
