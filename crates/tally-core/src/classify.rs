//! Keyword classification for free-text billing fields
//!
//! Warehouse bills describe fees in free text, in a mix of Chinese and
//! English, with no shared taxonomy between providers. The classifier
//! maps those descriptions onto the closed [`CostType`] set with an
//! ordered keyword table: first matching rule wins, so more specific
//! categories sit above generic ones. No match falls through to
//! `Other` — the classifier is total over all inputs.
//!
//! The transfer predicate does the same for platform ledgers: it marks
//! cash-movement entries (withdrawals, payouts) that are not revenue.

use crate::models::CostType;

/// Ordered rule table: (keyword set, category). Order is part of the
/// contract — e.g. "Account Management Fee" must hit `Management`
/// before any generic fallback could claim it.
const COST_RULES: &[(&[&str], CostType)] = &[
    (
        &["派送", "delivery", "shipping", "运费", "dispatch"],
        CostType::Shipping,
    ),
    (&["仓储", "storage", "仓租", "rent"], CostType::Storage),
    (
        &["入库", "inbound", "receiving", "goods in"],
        CostType::Inbound,
    ),
    (
        &["出库", "outbound", "fulfil", "pick"],
        CostType::Outbound,
    ),
    (
        &["操作", "handling", "process", "labour"],
        CostType::Handling,
    ),
    (
        &["包装", "packag", "box", "carton"],
        CostType::Packaging,
    ),
    (&["退货", "return", "rts"], CostType::Return),
    (
        &["管理", "management", "account", "admin"],
        CostType::Management,
    ),
    (&["头程", "freight"], CostType::Transport),
    (&["清关", "customs", "duty", "vat"], CostType::Customs),
];

/// Classify a free-text fee description into the closed cost taxonomy.
///
/// Case-insensitive substring match against the ordered rule table.
/// Never fails; unmatched text (including the empty string) is `Other`.
pub fn classify_cost(raw: &str) -> CostType {
    let text = raw.to_lowercase();
    for (keywords, cost_type) in COST_RULES {
        if keywords.iter().any(|k| text.contains(k)) {
            return *cost_type;
        }
    }
    CostType::Other
}

/// Transfer/withdrawal markers across all supported platforms. Covers
/// the localized variants Amazon exports use for transfer rows as well
/// as the Chinese withdrawal labels of the managed/marketplace ledgers.
const TRANSFER_KEYWORDS: &[&str] = &[
    "transfer",
    "payout",
    "withdrawal",
    "übertrag",
    "transfert",
    "振込",
    "送金",
    "提现",
    "出金",
];

/// Is this ledger entry a cash movement rather than revenue?
///
/// Pure predicate over the fixed keyword set, case-insensitive.
/// Transfer records are annotated and excluded from revenue sums, but
/// still reported as a withdrawal total for balance reconciliation.
pub fn is_transfer(transaction_type_raw: &str) -> bool {
    let text = transaction_type_raw.to_lowercase();
    TRANSFER_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_english() {
        assert_eq!(classify_cost("Account Management Fee"), CostType::Management);
        assert_eq!(classify_cost("Next Day Delivery"), CostType::Shipping);
        assert_eq!(classify_cost("Storage w/c 14 Jul"), CostType::Storage);
        assert_eq!(classify_cost("Goods In - 2 pallets"), CostType::Inbound);
        assert_eq!(classify_cost("Pick & Pack"), CostType::Outbound);
        assert_eq!(classify_cost("Customs Duty"), CostType::Customs);
    }

    #[test]
    fn test_classify_chinese() {
        assert_eq!(classify_cost("仓储费用 Q3"), CostType::Storage);
        assert_eq!(classify_cost("派送费"), CostType::Shipping);
        assert_eq!(classify_cost("入库上架费"), CostType::Inbound);
        assert_eq!(classify_cost("退货处理"), CostType::Return);
        assert_eq!(classify_cost("头程海运"), CostType::Transport);
    }

    #[test]
    fn test_classify_order_matters() {
        // "账单管理" must not be swallowed by an earlier generic rule
        assert_eq!(classify_cost("账单管理费"), CostType::Management);
        // shipping outranks the generic handling keywords
        assert_eq!(classify_cost("delivery handling"), CostType::Shipping);
    }

    #[test]
    fn test_classify_total_function() {
        assert_eq!(classify_cost("random text"), CostType::Other);
        assert_eq!(classify_cost(""), CostType::Other);
        assert_eq!(classify_cost("   "), CostType::Other);
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify_cost("STORAGE CHARGE"), CostType::Storage);
        assert_eq!(classify_cost("ReTuRn To SeNdEr"), CostType::Return);
    }

    #[test]
    fn test_is_transfer() {
        assert!(is_transfer("Transfer"));
        assert!(is_transfer("transfer to bank account"));
        assert!(is_transfer("Payout"));
        assert!(is_transfer("提现"));
        assert!(is_transfer("出金"));
        assert!(is_transfer("Übertrag auf Bankkonto"));
        assert!(!is_transfer("Order"));
        assert!(!is_transfer("Refund"));
        assert!(!is_transfer(""));
    }
}
