//! Debt simplification.
//!
//! Given each member's net balance in a group, [`simplify_debts`] produces a
//! short list of repayments that brings every balance back to zero.

use std::{cmp::Reverse, collections::BinaryHeap};

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// Net position of a member inside a group.
///
/// `net_minor = paid_minor - owed_minor`: positive means the group owes the
/// member money, negative means the member owes the group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub user_id: String,
    pub paid_minor: i64,
    pub owed_minor: i64,
    pub net_minor: i64,
}

impl MemberBalance {
    /// Fails with [`EngineError::InvalidAmount`] when the net does not fit.
    pub fn new(user_id: impl Into<String>, paid: Money, owed: Money) -> ResultEngine<Self> {
        let user_id = user_id.into();
        let net = paid.checked_sub(owed).ok_or_else(|| {
            EngineError::InvalidAmount(format!("balance of {user_id} is out of range"))
        })?;
        Ok(Self {
            user_id,
            paid_minor: paid.minor(),
            owed_minor: owed.minor(),
            net_minor: net.minor(),
        })
    }
}

/// A suggested repayment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_minor: i64,
}

/// Greedily matches the largest debtor with the largest creditor.
///
/// Each step settles at least one member completely, so `n` members with a
/// non-zero balance need at most `n - 1` transfers. Ties are broken by user
/// id so the plan is stable between calls. Balances must sum to zero; any
/// residue is left unmatched.
#[must_use]
pub fn simplify_debts(balances: &[MemberBalance]) -> Vec<Transfer> {
    let mut debtors: BinaryHeap<(i64, Reverse<String>)> = BinaryHeap::new();
    let mut creditors: BinaryHeap<(i64, Reverse<String>)> = BinaryHeap::new();

    for balance in balances {
        if balance.net_minor < 0 {
            debtors.push((-balance.net_minor, Reverse(balance.user_id.clone())));
        } else if balance.net_minor > 0 {
            creditors.push((balance.net_minor, Reverse(balance.user_id.clone())));
        }
    }

    let mut transfers = Vec::new();
    while let (Some((owes, Reverse(debtor))), Some((owed, Reverse(creditor)))) =
        (debtors.pop(), creditors.pop())
    {
        let amount_minor = owes.min(owed);
        transfers.push(Transfer {
            from_user_id: debtor.clone(),
            to_user_id: creditor.clone(),
            amount_minor,
        });

        if owes > amount_minor {
            debtors.push((owes - amount_minor, Reverse(debtor)));
        }
        if owed > amount_minor {
            creditors.push((owed - amount_minor, Reverse(creditor)));
        }
    }

    transfers
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use proptest::prelude::*;

    fn net(user_id: &str, net_minor: i64) -> MemberBalance {
        MemberBalance {
            user_id: user_id.to_string(),
            paid_minor: net_minor.max(0),
            owed_minor: (-net_minor).max(0),
            net_minor,
        }
    }

    fn apply(balances: &[MemberBalance], transfers: &[Transfer]) -> HashMap<String, i64> {
        let mut nets: HashMap<String, i64> = balances
            .iter()
            .map(|b| (b.user_id.clone(), b.net_minor))
            .collect();
        for transfer in transfers {
            *nets.entry(transfer.from_user_id.clone()).or_default() += transfer.amount_minor;
            *nets.entry(transfer.to_user_id.clone()).or_default() -= transfer.amount_minor;
        }
        nets
    }

    #[test]
    fn one_payer_two_debtors() {
        let balances = vec![net("alice", 2000), net("bob", -1000), net("carol", -1000)];
        let transfers = simplify_debts(&balances);
        assert_eq!(
            transfers,
            vec![
                Transfer {
                    from_user_id: "bob".to_string(),
                    to_user_id: "alice".to_string(),
                    amount_minor: 1000,
                },
                Transfer {
                    from_user_id: "carol".to_string(),
                    to_user_id: "alice".to_string(),
                    amount_minor: 1000,
                },
            ]
        );
    }

    #[test]
    fn chains_collapse_into_direct_payment() {
        // bob owes alice 10, carol owes bob 10: carol can pay alice directly.
        let balances = vec![net("alice", 1000), net("bob", 0), net("carol", -1000)];
        let transfers = simplify_debts(&balances);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from_user_id, "carol");
        assert_eq!(transfers[0].to_user_id, "alice");
    }

    #[test]
    fn settled_group_needs_no_transfer() {
        assert!(simplify_debts(&[net("alice", 0), net("bob", 0)]).is_empty());
        assert!(simplify_debts(&[]).is_empty());
    }

    #[test]
    fn member_balance_computes_net() {
        let balance = MemberBalance::new("alice", Money::new(3000), Money::new(1000)).unwrap();
        assert_eq!(balance.net_minor, 2000);
    }

    #[test]
    fn member_balance_rejects_an_overflowing_net() {
        let err = MemberBalance::new("alice", Money::new(i64::MAX), Money::new(-1)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("balance of alice is out of range".to_string())
        );
    }

    proptest! {
        #[test]
        fn transfers_zero_every_balance(nets in prop::collection::vec(-50_000i64..50_000, 1..12)) {
            let mut balances: Vec<MemberBalance> = nets
                .iter()
                .enumerate()
                .map(|(i, n)| net(&format!("u{i:02}"), *n))
                .collect();
            let residue: i64 = nets.iter().sum();
            balances.push(net("zz", -residue));

            let transfers = simplify_debts(&balances);
            prop_assert!(apply(&balances, &transfers).values().all(|v| *v == 0));
            prop_assert!(transfers.iter().all(|t| t.amount_minor > 0));

            let non_zero = balances.iter().filter(|b| b.net_minor != 0).count();
            prop_assert!(transfers.len() <= non_zero.saturating_sub(1));

            let payers: HashSet<&str> = transfers.iter().map(|t| t.from_user_id.as_str()).collect();
            let receivers: HashSet<&str> = transfers.iter().map(|t| t.to_user_id.as_str()).collect();
            prop_assert!(payers.is_disjoint(&receivers));

            prop_assert_eq!(simplify_debts(&balances), transfers);
        }
    }
}
