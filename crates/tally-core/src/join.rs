//! Cross-domain joiner: platform revenue vs warehouse cost
//!
//! Joins monthly revenue and cost summaries on (store, billing period).
//! Currency is deliberately not part of the join key — a store can earn
//! in GBP and pay fulfillment in USD, and the two figures are reported
//! side by side. A net figure is only computed when both sides share a
//! currency; otherwise it stays absent. An unmatched side is likewise
//! absent, never zero, so "no cost incurred" and "cost data missing"
//! remain distinguishable downstream.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{Dimension, Summary};

/// An amount tagged with its currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

/// Per store/month comparison of revenue vs fulfillment cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetResult {
    pub store_id: String,
    pub billing_period: String,
    pub revenue: Option<Money>,
    pub cost: Option<Money>,
    /// revenue − cost, only when both sides exist in the same currency
    pub net: Option<Decimal>,
}

type JoinKey = (String, String);

/// Collapse one side's summaries onto (store, period), summing matching
/// currencies. A key that ends up holding more than one currency cannot
/// be reported as a single figure and comes back as None.
fn collect_side(summaries: &[Summary], side: &str) -> BTreeMap<JoinKey, Option<Money>> {
    let mut by_key: BTreeMap<JoinKey, Vec<Money>> = BTreeMap::new();

    for summary in summaries {
        let (Some(store), Some(period)) = (
            summary.value(Dimension::Store),
            summary.value(Dimension::Period),
        ) else {
            debug!(side, "summary without store/period dimensions skipped in join");
            continue;
        };
        let entry = by_key
            .entry((store.to_string(), period.to_string()))
            .or_default();
        if let Some(money) = entry
            .iter_mut()
            .find(|m| m.currency == summary.currency)
        {
            money.amount += summary.total;
        } else {
            entry.push(Money {
                amount: summary.total,
                currency: summary.currency.clone(),
            });
        }
    }

    by_key
        .into_iter()
        .map(|(key, moneys)| {
            let money = match moneys.len() {
                1 => moneys.into_iter().next(),
                n => {
                    warn!(
                        side,
                        store = %key.0,
                        period = %key.1,
                        currencies = n,
                        "multiple currencies on one side of the join; reported as absent"
                    );
                    None
                }
            };
            (key, money)
        })
        .collect()
}

/// Join revenue and cost summaries into per store/month net results.
pub fn join_net(revenue: &[Summary], cost: &[Summary]) -> Vec<NetResult> {
    let revenue_side = collect_side(revenue, "revenue");
    let cost_side = collect_side(cost, "cost");

    let mut keys: Vec<JoinKey> = revenue_side.keys().cloned().collect();
    for key in cost_side.keys() {
        if !revenue_side.contains_key(key) {
            keys.push(key.clone());
        }
    }
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let revenue = revenue_side.get(&key).cloned().flatten();
            let cost = cost_side.get(&key).cloned().flatten();
            let net = match (&revenue, &cost) {
                (Some(r), Some(c)) if r.currency == c.currency => Some(r.amount - c.amount),
                _ => None,
            };
            NetResult {
                store_id: key.0,
                billing_period: key.1,
                revenue,
                cost,
                net,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary(store: &str, period: &str, currency: &str, total: Decimal) -> Summary {
        Summary {
            key: vec![
                (Dimension::Store, store.to_string()),
                (Dimension::Period, period.to_string()),
                (Dimension::Currency, currency.to_string()),
            ],
            currency: currency.to_string(),
            total,
            record_count: 1,
            by_cost_type: BTreeMap::new(),
            by_document_kind: BTreeMap::new(),
        }
    }

    #[test]
    fn test_same_currency_nets() {
        let results = join_net(
            &[summary("s", "2025-07", "USD", dec!(1000.00))],
            &[summary("s", "2025-07", "USD", dec!(300.00))],
        );
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.revenue.as_ref().unwrap().amount, dec!(1000.00));
        assert_eq!(r.cost.as_ref().unwrap().amount, dec!(300.00));
        assert_eq!(r.net, Some(dec!(700.00)));
    }

    #[test]
    fn test_cross_currency_reports_both_without_net() {
        let results = join_net(
            &[summary("s", "2025-07", "USD", dec!(1000.00))],
            &[summary("s", "2025-07", "GBP", dec!(300.00))],
        );
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.revenue.as_ref().unwrap().currency, "USD");
        assert_eq!(r.cost.as_ref().unwrap().currency, "GBP");
        assert_eq!(r.net, None);
    }

    #[test]
    fn test_unmatched_sides_are_absent_not_zero() {
        let results = join_net(
            &[summary("only-revenue", "2025-07", "USD", dec!(10.00))],
            &[summary("only-cost", "2025-07", "USD", dec!(5.00))],
        );
        assert_eq!(results.len(), 2);
        let rev = results.iter().find(|r| r.store_id == "only-revenue").unwrap();
        assert!(rev.cost.is_none());
        assert!(rev.net.is_none());
        let cost = results.iter().find(|r| r.store_id == "only-cost").unwrap();
        assert!(cost.revenue.is_none());
        assert!(cost.net.is_none());
    }

    #[test]
    fn test_output_sorted_by_store_then_period() {
        let results = join_net(
            &[
                summary("b", "2025-07", "USD", dec!(1.00)),
                summary("a", "2025-08", "USD", dec!(1.00)),
                summary("a", "2025-07", "USD", dec!(1.00)),
            ],
            &[],
        );
        let keys: Vec<_> = results
            .iter()
            .map(|r| (r.store_id.clone(), r.billing_period.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a".to_string(), "2025-07".to_string()),
                ("a".to_string(), "2025-08".to_string()),
                ("b".to_string(), "2025-07".to_string()),
            ]
        );
    }

    #[test]
    fn test_same_currency_summaries_merge() {
        // two revenue summaries for one store/month in the same
        // currency (e.g. different sites) sum into one figure
        let results = join_net(
            &[
                summary("s", "2025-07", "USD", dec!(600.00)),
                summary("s", "2025-07", "USD", dec!(400.00)),
            ],
            &[summary("s", "2025-07", "USD", dec!(300.00))],
        );
        assert_eq!(results[0].revenue.as_ref().unwrap().amount, dec!(1000.00));
        assert_eq!(results[0].net, Some(dec!(700.00)));
    }
}
