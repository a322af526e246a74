//! Filename inference
//!
//! Several document families carry structured data in their names
//! instead of their bodies: site codes for platform exports, billing
//! months for warehouse spreadsheets, and for scanned invoices the
//! document date itself. All of that decoding lives here as pure
//! functions so each encoding has exactly one implementation.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

fn regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hardcoded regex"))
}

/// Site/region codes that appear in filenames and settlement ids
pub const KNOWN_SITES: &[&str] = &["UK", "DE", "US", "CA", "FR", "IT", "ES", "JP", "AU"];

/// Site code -> billing currency
pub fn site_currency(site: &str) -> Option<&'static str> {
    match site.to_uppercase().as_str() {
        "UK" => Some("GBP"),
        "DE" | "FR" | "IT" | "ES" => Some("EUR"),
        "US" => Some("USD"),
        "CA" => Some("CAD"),
        "JP" => Some("JPY"),
        "AU" => Some("AUD"),
        _ => None,
    }
}

/// Store/site pair inferred from a filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteToken {
    pub store: String,
    pub site: String,
}

/// Extract a store/site pair from a platform export filename.
///
/// Supported shapes, store first or site first:
/// `4-DE2025Jul...`, `account4-uk 2025...`, `store10_UK 2025Nov...`,
/// `UK 2025Apr...`, `DE_2025Apr...`
pub fn site_token(filename: &str) -> Option<SiteToken> {
    let base = filename.split('.').next().unwrap_or(filename);

    static STORE_FIRST: OnceLock<Regex> = OnceLock::new();
    let store_first = regex(
        &STORE_FIRST,
        r"(?i)^(.+?)[-_\s]+(UK|DE|US|CA|FR|IT|ES|JP|AU)([\s_\-\d]|$)",
    );
    if let Some(caps) = store_first.captures(base) {
        return Some(SiteToken {
            store: caps[1].trim().to_string(),
            site: caps[2].to_uppercase(),
        });
    }

    static SITE_FIRST: OnceLock<Regex> = OnceLock::new();
    let site_first = regex(
        &SITE_FIRST,
        r"(?i)^(UK|DE|US|CA|FR|IT|ES|JP|AU)[-_\s]+(.+)$",
    );
    if let Some(caps) = site_first.captures(base) {
        return Some(SiteToken {
            store: caps[2].trim().to_string(),
            site: caps[1].to_uppercase(),
        });
    }

    None
}

/// Document classification read off the filename suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameKind {
    /// Plain name: a billable invoice
    Invoice,
    /// `_CREDIT` suffix: a credit note, contributes negatively
    CreditNote,
    /// `_Appendix` suffix: line-item detail whose sibling invoice
    /// already carries the total. Excluded entirely from aggregation.
    Appendix,
}

/// Classify a document by its filename suffix.
pub fn filename_kind(filename: &str) -> FilenameKind {
    let stem = filename
        .rsplit('/')
        .next()
        .unwrap_or(filename)
        .split('.')
        .next()
        .unwrap_or(filename)
        .to_lowercase();
    if stem.ends_with("_appendix") {
        FilenameKind::Appendix
    } else if stem.ends_with("_credit") {
        FilenameKind::CreditNote
    } else {
        FilenameKind::Invoice
    }
}

/// Date and sequence decoded from a sequence-numbered invoice filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDate {
    pub date: NaiveDate,
    /// Digits following the date window, identifying the document
    /// within its billing day
    pub sequence: String,
}

/// Decode a sequence-numbered invoice filename such as `702510206R.pdf`.
///
/// The leading digit run embeds the document date as a `YYMMDD` window
/// (years resolve into the 2000s). The window is located by scanning
/// left to right for the first six digits that form a valid calendar
/// date; digits before it are a ledger prefix, digits after it are the
/// document sequence, and a trailing letter is ignored.
///
/// `702510206R` → 2025-10-20, sequence `6`. A run with no valid date
/// window (e.g. month 13) yields `None`, which callers surface as an
/// unparseable-filename warning.
pub fn sequence_date(filename: &str) -> Option<SequenceDate> {
    let stem = filename
        .rsplit('/')
        .next()
        .unwrap_or(filename)
        .split('.')
        .next()
        .unwrap_or(filename);

    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 6 {
        return None;
    }

    for start in 0..=digits.len() - 6 {
        let window = &digits[start..start + 6];
        let yy: u32 = window[0..2].parse().ok()?;
        let mm: u32 = window[2..4].parse().ok()?;
        let dd: u32 = window[4..6].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(2000 + yy as i32, mm, dd) {
            return Some(SequenceDate {
                date,
                sequence: digits[start + 6..].to_string(),
            });
        }
    }

    None
}

/// Billing month (`YYYY-MM`) encoded in a warehouse export filename.
///
/// Recognized shapes, in order:
/// - `Jul25` month-abbreviation + two-digit year (years 24-29, so
///   timestamps like `Jan01` cannot be misread as 2001)
/// - `November 2025` / `November 25` full month name + year
/// - `2025-7月` Chinese month export
/// - `2025-07` plain year-month
pub fn month_token(filename: &str) -> Option<String> {
    let lower = filename.to_lowercase();

    const MONTHS: &[(&str, &str, u32)] = &[
        ("january", "jan", 1),
        ("february", "feb", 2),
        ("march", "mar", 3),
        ("april", "apr", 4),
        ("may", "may", 5),
        ("june", "jun", 6),
        ("july", "jul", 7),
        ("august", "aug", 8),
        ("september", "sep", 9),
        ("october", "oct", 10),
        ("november", "nov", 11),
        ("december", "dec", 12),
    ];

    static MON_YY: OnceLock<Regex> = OnceLock::new();
    let mon_yy = regex(&MON_YY, r"([a-z]{3})(2[4-9])");
    if let Some(caps) = mon_yy.captures(&lower) {
        let abbr = &caps[1];
        if let Some((_, _, m)) = MONTHS.iter().find(|(_, a, _)| *a == abbr) {
            return Some(format!("20{}-{:02}", &caps[2], m));
        }
    }

    for (name, _, m) in MONTHS {
        if lower.contains(name) {
            static YEAR_AFTER: OnceLock<Regex> = OnceLock::new();
            let year_after = regex(&YEAR_AFTER, r"(202[4-9]|2[4-9])\b");
            if let Some(rest) = lower.split(name).nth(1) {
                if let Some(caps) = year_after.captures(rest) {
                    let y = &caps[1];
                    let year = if y.len() == 4 {
                        y.to_string()
                    } else {
                        format!("20{}", y)
                    };
                    return Some(format!("{}-{:02}", year, m));
                }
            }
        }
    }

    static CN_MONTH: OnceLock<Regex> = OnceLock::new();
    let cn_month = regex(&CN_MONTH, r"(\d{4})-(\d{1,2})月");
    if let Some(caps) = cn_month.captures(filename) {
        let m: u32 = caps[2].parse().ok()?;
        if (1..=12).contains(&m) {
            return Some(format!("{}-{:02}", &caps[1], m));
        }
    }

    static PLAIN_YM: OnceLock<Regex> = OnceLock::new();
    let plain_ym = regex(&PLAIN_YM, r"(\d{4})-(\d{2})(?:\D|$)");
    if let Some(caps) = plain_ym.captures(filename) {
        let m: u32 = caps[2].parse().ok()?;
        if (1..=12).contains(&m) {
            return Some(format!("{}-{:02}", &caps[1], m));
        }
    }

    None
}

/// Billing month derived from a payment-due-date token (`M20250101` /
/// `A20241001`). The statement period is the previous calendar month,
/// so the period is taken from the due date minus one day.
pub fn due_date_period(filename: &str) -> Option<String> {
    static DUE: OnceLock<Regex> = OnceLock::new();
    let due = regex(&DUE, r"(?i)[AM](\d{4})(\d{2})(\d{2})");
    let caps = due.captures(filename)?;
    let date = NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    let last_day = date.pred_opt()?;
    Some(billing_period(last_day))
}

/// Calendar month a date is attributed to, as `YYYY-MM`.
pub fn billing_period(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}
