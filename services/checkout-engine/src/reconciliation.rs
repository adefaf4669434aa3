//! Ledger replay: recompute a user's balance from their transactions and
//! compare it with the stored balance.

use crate::models::LedgerEntry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainBreak {
    /// The entry does not start where the previous one ended.
    Discontinuity {
        entry_id: i64,
        expected_previous: Decimal,
        recorded_previous: Decimal,
    },
    /// `previous + amount` does not give the recorded `new` balance.
    Arithmetic {
        entry_id: i64,
        previous: Decimal,
        amount: Decimal,
        recorded_new: Decimal,
    },
    NegativeBalance {
        entry_id: i64,
        balance: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub opening_balance: Decimal,
    /// Sum of signed entry amounts.
    pub ledger_sum: Decimal,
    pub expected_balance: Decimal,
    pub current_balance: Decimal,
    pub entries: usize,
    pub chain_breaks: Vec<ChainBreak>,
    pub consistent: bool,
}

/// Replay `entries` (in append order) from `opening_balance`.
///
/// The user is consistent when the replayed balance equals
/// `current_balance` and every entry continues the chain left by the one
/// before it.
pub fn replay(
    opening_balance: Decimal,
    entries: &[LedgerEntry],
    current_balance: Decimal,
) -> ReconciliationReport {
    let mut running = opening_balance;
    let mut ledger_sum = Decimal::ZERO;
    let mut chain_breaks = Vec::new();

    for entry in entries {
        if entry.previous_balance != running {
            chain_breaks.push(ChainBreak::Discontinuity {
                entry_id: entry.id,
                expected_previous: running,
                recorded_previous: entry.previous_balance,
            });
        }

        if entry.previous_balance.checked_add(entry.amount) != Some(entry.new_balance) {
            chain_breaks.push(ChainBreak::Arithmetic {
                entry_id: entry.id,
                previous: entry.previous_balance,
                amount: entry.amount,
                recorded_new: entry.new_balance,
            });
        }

        if entry.new_balance < Decimal::ZERO {
            chain_breaks.push(ChainBreak::NegativeBalance {
                entry_id: entry.id,
                balance: entry.new_balance,
            });
        }

        ledger_sum += entry.amount;
        running = entry.new_balance;
    }

    let expected_balance = opening_balance + ledger_sum;
    let consistent = chain_breaks.is_empty() && expected_balance == current_balance;

    ReconciliationReport {
        opening_balance,
        ledger_sum,
        expected_balance,
        current_balance,
        entries: entries.len(),
        chain_breaks,
        consistent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerEntryKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(id: i64, kind: LedgerEntryKind, amount: i64, previous: i64, new: i64) -> LedgerEntry {
        LedgerEntry {
            id,
            user_id: Uuid::nil(),
            kind,
            amount: Decimal::new(amount, 0),
            description: String::new(),
            order_id: None,
            previous_balance: Decimal::new(previous, 0),
            new_balance: Decimal::new(new, 0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_clean_history_is_consistent() {
        let entries = vec![
            entry(1, LedgerEntryKind::Purchase, -3000, 5000, 2000),
            entry(2, LedgerEntryKind::Topup, 1000, 2000, 3000),
            entry(3, LedgerEntryKind::Purchase, -2900, 3000, 100),
        ];
        let report = replay(Decimal::new(5000, 0), &entries, Decimal::new(100, 0));

        assert!(report.consistent);
        assert_eq!(report.ledger_sum, Decimal::new(-4900, 0));
        assert_eq!(report.expected_balance, Decimal::new(100, 0));
        assert_eq!(report.entries, 3);
    }

    #[test]
    fn test_empty_ledger_matches_opening_balance() {
        let report = replay(Decimal::new(5000, 0), &[], Decimal::new(5000, 0));
        assert!(report.consistent);
        assert_eq!(report.ledger_sum, Decimal::ZERO);
    }

    #[test]
    fn test_balance_drift_is_inconsistent() {
        let entries = vec![entry(1, LedgerEntryKind::Purchase, -3000, 5000, 2000)];
        let report = replay(Decimal::new(5000, 0), &entries, Decimal::new(1500, 0));

        assert!(!report.consistent);
        assert!(report.chain_breaks.is_empty());
    }

    #[test]
    fn test_chain_break_detected() {
        let entries = vec![
            entry(1, LedgerEntryKind::Purchase, -3000, 5000, 2000),
            entry(2, LedgerEntryKind::Purchase, -700, 2500, 1800),
        ];
        let report = replay(Decimal::new(5000, 0), &entries, Decimal::new(1800, 0));

        assert!(!report.consistent);
        assert_eq!(
            report.chain_breaks,
            vec![ChainBreak::Discontinuity {
                entry_id: 2,
                expected_previous: Decimal::new(2000, 0),
                recorded_previous: Decimal::new(2500, 0),
            }]
        );
    }
}
