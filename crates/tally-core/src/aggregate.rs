//! Aggregation engine
//!
//! Folds canonical records into monthly summaries along a requested
//! dimension tuple. Currency is always appended to the effective key —
//! two records in different currencies must never sum together, whether
//! or not the caller asked for a currency split.
//!
//! Accumulation is exact decimal throughout. Output order is the
//! lexicographic order of the key tuple, so reports and tests are
//! reproducible. Grouping is a single pass; partial aggregations over
//! input batches merge into the same totals as one aggregation over
//! the whole input.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CostType, DocumentKind, Transaction, WarehouseCost};

/// Report dimensions records can group by
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Store identifier
    Store,
    /// Platform or warehouse name
    Source,
    /// Site/region code
    Site,
    /// Billing period (YYYY-MM)
    Period,
    /// ISO-like currency code
    Currency,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Source => "source",
            Self::Site => "site",
            Self::Period => "period",
            Self::Currency => "currency",
        }
    }

    fn of_transaction(&self, t: &Transaction) -> String {
        match self {
            Self::Store => t.store_id.clone(),
            Self::Source => t.platform.to_string(),
            Self::Site => t.site.clone().unwrap_or_default(),
            Self::Period => t.billing_period.clone(),
            Self::Currency => t.currency.clone(),
        }
    }

    fn of_cost(&self, c: &WarehouseCost) -> String {
        match self {
            Self::Store => c.store_id.clone().unwrap_or_default(),
            Self::Source => c.warehouse.to_string(),
            Self::Site => c.region.clone(),
            Self::Period => c.billing_period.clone(),
            Self::Currency => c.currency.clone(),
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "store" => Ok(Self::Store),
            "source" | "platform" | "warehouse" => Ok(Self::Source),
            "site" | "region" => Ok(Self::Site),
            "period" | "month" => Ok(Self::Period),
            "currency" => Ok(Self::Currency),
            _ => Err(format!("Unknown dimension: {}", s)),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One aggregated group: the key values it groups on and its totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub key: Vec<(Dimension, String)>,
    pub currency: String,
    pub total: Decimal,
    pub record_count: usize,
    /// Per-category subtotals; populated for warehouse aggregations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_cost_type: BTreeMap<CostType, Decimal>,
    /// Invoice vs credit-note subtotals; populated for warehouse
    /// aggregations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_document_kind: BTreeMap<DocumentKind, Decimal>,
}

impl Summary {
    /// The value this summary carries for a dimension, if it was part
    /// of the grouping key
    pub fn value(&self, dim: Dimension) -> Option<&str> {
        self.key
            .iter()
            .find(|(d, _)| *d == dim)
            .map(|(_, v)| v.as_str())
    }
}

/// Revenue and withdrawal summaries over the same key shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueAggregation {
    /// Non-transfer records only
    pub revenue: Vec<Summary>,
    /// Transfer/withdrawal records, reported alongside for balance
    /// reconciliation
    pub transfers: Vec<Summary>,
}

/// Requested dimensions with currency enforced as part of the key
fn effective_dimensions(dimensions: &[Dimension]) -> Vec<Dimension> {
    let mut dims: Vec<Dimension> = Vec::new();
    for d in dimensions {
        if !dims.contains(d) {
            dims.push(*d);
        }
    }
    if !dims.contains(&Dimension::Currency) {
        dims.push(Dimension::Currency);
    }
    dims
}

fn group<'a, R, I, F>(records: I, dims: &[Dimension], value_of: F) -> BTreeMap<Vec<String>, Vec<&'a R>>
where
    I: IntoIterator<Item = &'a R>,
    F: Fn(&Dimension, &R) -> String,
{
    let mut groups: BTreeMap<Vec<String>, Vec<&R>> = BTreeMap::new();
    for record in records {
        let key: Vec<String> = dims.iter().map(|d| value_of(d, record)).collect();
        groups.entry(key).or_default().push(record);
    }
    groups
}

fn keyed(dims: &[Dimension], key: Vec<String>) -> Vec<(Dimension, String)> {
    dims.iter().copied().zip(key).collect()
}

fn currency_of(key: &[(Dimension, String)]) -> String {
    key.iter()
        .find(|(d, _)| *d == Dimension::Currency)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn summarize_transactions(
    groups: BTreeMap<Vec<String>, Vec<&Transaction>>,
    dims: &[Dimension],
) -> Vec<Summary> {
    groups
        .into_iter()
        .map(|(key, records)| {
            let key = keyed(dims, key);
            Summary {
                currency: currency_of(&key),
                total: records.iter().map(|t| t.amount).sum(),
                record_count: records.len(),
                by_cost_type: BTreeMap::new(),
                by_document_kind: BTreeMap::new(),
                key,
            }
        })
        .collect()
}

/// Aggregate platform transactions along the requested dimensions.
///
/// Transfer records are excluded from the revenue summaries and folded
/// into a parallel transfers list with the same key shape. Empty input
/// produces no summary rows — absence means "no activity", not zero.
pub fn aggregate_transactions(
    records: &[Transaction],
    dimensions: &[Dimension],
) -> RevenueAggregation {
    let dims = effective_dimensions(dimensions);
    let value_of = |d: &Dimension, t: &Transaction| d.of_transaction(t);

    let revenue = group(
        records.iter().filter(|t| !t.is_transfer),
        &dims,
        value_of,
    );
    let transfers = group(records.iter().filter(|t| t.is_transfer), &dims, value_of);

    RevenueAggregation {
        revenue: summarize_transactions(revenue, &dims),
        transfers: summarize_transactions(transfers, &dims),
    }
}

/// Aggregate warehouse cost lines along the requested dimensions, with
/// per-cost-type and per-document-kind subtotals.
pub fn aggregate_costs(records: &[WarehouseCost], dimensions: &[Dimension]) -> Vec<Summary> {
    let dims = effective_dimensions(dimensions);
    let groups = group(records.iter(), &dims, |d, c| d.of_cost(c));

    groups
        .into_iter()
        .map(|(key, records)| {
            let key = keyed(&dims, key);
            let mut by_cost_type: BTreeMap<CostType, Decimal> = BTreeMap::new();
            let mut by_document_kind: BTreeMap<DocumentKind, Decimal> = BTreeMap::new();
            for c in &records {
                *by_cost_type.entry(c.cost_type).or_default() += c.amount;
                *by_document_kind.entry(c.document_kind).or_default() += c.amount;
            }
            Summary {
                currency: currency_of(&key),
                total: records.iter().map(|c| c.amount).sum(),
                record_count: records.len(),
                by_cost_type,
                by_document_kind,
                key,
            }
        })
        .collect()
}

/// Merge partial aggregations, summing groups with matching keys.
///
/// `merge(aggregate(A), aggregate(B)) == aggregate(A ∪ B)` for any
/// batch split, which is what makes parallel per-batch aggregation
/// safe.
pub fn merge_summaries(a: Vec<Summary>, b: Vec<Summary>) -> Vec<Summary> {
    let mut merged: BTreeMap<Vec<(Dimension, String)>, Summary> = BTreeMap::new();
    for summary in a.into_iter().chain(b) {
        match merged.entry(summary.key.clone()) {
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(summary);
            }
            std::collections::btree_map::Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                existing.total += summary.total;
                existing.record_count += summary.record_count;
                for (k, v) in summary.by_cost_type {
                    *existing.by_cost_type.entry(k).or_default() += v;
                }
                for (k, v) in summary.by_document_kind {
                    *existing.by_document_kind.entry(k).or_default() += v;
                }
            }
        }
    }
    merged.into_values().collect()
}
