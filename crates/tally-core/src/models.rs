//! Domain models for tally

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Supported sales platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Amazon,
    Temu,
    Shein,
    ManagedStore,
    MarketplaceX,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amazon => "amazon",
            Self::Temu => "temu",
            Self::Shein => "shein",
            Self::ManagedStore => "managed_store",
            Self::MarketplaceX => "marketplace_x",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amazon" => Ok(Self::Amazon),
            "temu" => Ok(Self::Temu),
            "shein" => Ok(Self::Shein),
            "managed_store" | "managed" => Ok(Self::ManagedStore),
            "marketplace_x" | "marketplace" => Ok(Self::MarketplaceX),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Third-party warehouse providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseProvider {
    Tsp,
    Haiyang,
    Xiyou,
    G7,
}

impl WarehouseProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tsp => "tsp",
            Self::Haiyang => "haiyang",
            Self::Xiyou => "xiyou",
            Self::G7 => "g7",
        }
    }

    /// Region the provider's bills are issued from
    pub fn region(&self) -> &'static str {
        match self {
            Self::Tsp | Self::Haiyang | Self::Xiyou => "UK",
            Self::G7 => "US",
        }
    }

    /// Billing currency when the document itself does not state one
    pub fn default_currency(&self) -> &'static str {
        match self {
            Self::Tsp | Self::Haiyang | Self::Xiyou => "GBP",
            Self::G7 => "USD",
        }
    }
}

impl std::str::FromStr for WarehouseProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsp" => Ok(Self::Tsp),
            "haiyang" => Ok(Self::Haiyang),
            "xiyou" => Ok(Self::Xiyou),
            "g7" => Ok(Self::G7),
            _ => Err(format!("Unknown warehouse provider: {}", s)),
        }
    }
}

impl std::fmt::Display for WarehouseProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routing tag attached to each document by the discovery layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Platform(Platform),
    Warehouse(WarehouseProvider),
}

impl std::str::FromStr for SourceTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(p) = s.parse::<Platform>() {
            return Ok(Self::Platform(p));
        }
        if let Ok(w) = s.parse::<WarehouseProvider>() {
            return Ok(Self::Warehouse(w));
        }
        Err(format!("Unknown source tag: {}", s))
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform(p) => write!(f, "{}", p),
            Self::Warehouse(w) => write!(f, "{}", w),
        }
    }
}

/// One platform revenue/withdrawal line, post-normalization.
///
/// Created once by a source parser and never mutated afterwards. The
/// amount keeps the precision the source document stated; no implicit
/// rounding happens anywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub store_id: String,
    pub platform: Platform,
    /// Site/region code (UK, DE, ...). None when it could not be
    /// resolved; such records are flagged for revenue attribution.
    pub site: Option<String>,
    pub currency: String,
    pub amount: Decimal,
    /// Original transaction-type text from the document
    pub transaction_type_raw: String,
    /// Account transfer/withdrawal entries are annotated, not deleted:
    /// they are excluded from revenue but still summed for
    /// reconciliation against the platform's stated balance.
    pub is_transfer: bool,
    pub transaction_date: Option<NaiveDate>,
    /// Calendar month (YYYY-MM) this record is attributed to. Derived
    /// from the transaction date, falling back to the document-level
    /// period for undated rows.
    pub billing_period: String,
    pub source_file: String,
    pub row_number: usize,
}

/// Closed fee-category taxonomy for warehouse costs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CostType {
    Shipping,
    Storage,
    Inbound,
    Outbound,
    Handling,
    Packaging,
    Return,
    Management,
    Transport,
    Customs,
    Other,
}

impl CostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Storage => "storage",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Handling => "handling",
            Self::Packaging => "packaging",
            Self::Return => "return",
            Self::Management => "management",
            Self::Transport => "transport",
            Self::Customs => "customs",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for CostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing document type. Appendix documents never reach record form:
/// they are excluded during parsing so their sibling invoice's total is
/// not counted twice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    CreditNote,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::CreditNote => "credit_note",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One warehouse fee/credit line, post-normalization.
///
/// Sign convention is fixed at parse time: invoices yield positive
/// amounts, credit notes negative, regardless of the sign printed in
/// the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseCost {
    pub warehouse: WarehouseProvider,
    pub region: String,
    pub order_id: Option<String>,
    pub sku: Option<String>,
    pub tracking_number: Option<String>,
    pub store_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub cost_type: CostType,
    /// Original fee-description text the cost type was classified from
    pub cost_type_raw: String,
    pub cost_date: Option<NaiveDate>,
    pub billing_period: String,
    pub document_kind: DocumentKind,
    pub source_file: String,
    pub row_number: usize,
}

/// Per-file parse statistics, reported next to the records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub source_file: String,
    pub source: String,
    /// Resolved billing period, when the document carries one
    pub billing_period: Option<String>,
    pub currency: Option<String>,
    pub site: Option<String>,
    pub total_rows: usize,
    pub parsed_rows: usize,
    pub skipped_rows: usize,
    /// Rows whose stated total matched the sum of their components
    pub verified_rows: usize,
    pub mismatched_rows: usize,
    pub record_count: usize,
    pub net_amount: Decimal,
}

/// Why a document (or part of one) was excluded or flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// No currency column, provider default, or body statement found
    MissingCurrency,
    /// Site could not be resolved; soft, blocks revenue attribution only
    MissingSite,
    /// Filename carries no recognizable date/sequence encoding
    UnparseableFilename,
    /// Document type could not be classified from its name/content
    UnrecognizedDocumentType,
    /// Line items do not reconcile with the stated total
    TotalMismatch,
    /// Nothing extractable in the document
    EmptyDocument,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCurrency => "missing_currency",
            Self::MissingSite => "missing_site",
            Self::UnparseableFilename => "unparseable_filename",
            Self::UnrecognizedDocumentType => "unrecognized_document_type",
            Self::TotalMismatch => "total_mismatch",
            Self::EmptyDocument => "empty_document",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document-scoped warning. Never fatal: the offending document's
/// records are excluded and the run continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub source_file: String,
    pub kind: IssueKind,
    pub detail: String,
}

impl Issue {
    pub fn new(source_file: impl Into<String>, kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            kind,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trip() {
        for p in [
            Platform::Amazon,
            Platform::Temu,
            Platform::Shein,
            Platform::ManagedStore,
            Platform::MarketplaceX,
        ] {
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
        }
        assert!("ebay".parse::<Platform>().is_err());
    }

    #[test]
    fn test_warehouse_defaults() {
        assert_eq!(WarehouseProvider::Tsp.default_currency(), "GBP");
        assert_eq!(WarehouseProvider::G7.default_currency(), "USD");
        assert_eq!(WarehouseProvider::Haiyang.region(), "UK");
    }

    #[test]
    fn test_source_tag_parsing() {
        assert_eq!(
            "amazon".parse::<SourceTag>().unwrap(),
            SourceTag::Platform(Platform::Amazon)
        );
        assert_eq!(
            "g7".parse::<SourceTag>().unwrap(),
            SourceTag::Warehouse(WarehouseProvider::G7)
        );
        assert!("nowhere".parse::<SourceTag>().is_err());
    }
}
