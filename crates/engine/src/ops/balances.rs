use std::collections::HashMap;

use sea_orm::{ConnectionTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    EngineError, MemberBalance, Money, ResultEngine, Transfer, expense_shares, expenses,
    group_memberships, settlement::simplify_debts,
};

/// Adds `amount_minor` to a running ledger total.
fn accumulate(total: &mut Money, amount_minor: i64) -> ResultEngine<()> {
    *total = total
        .checked_add(Money::new(amount_minor))
        .ok_or_else(|| EngineError::InvalidAmount("group ledger total is out of range".to_string()))?;
    Ok(())
}

use super::Engine;

impl Engine {
    /// Replays the non-voided ledger of a group into per-member balances.
    ///
    /// Members come first in join order; people who left the group but still
    /// appear in the ledger are appended after them.
    pub(super) async fn ledger_balances<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
    ) -> ResultEngine<Vec<MemberBalance>> {
        let memberships = group_memberships::Entity::find()
            .filter(group_memberships::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(group_memberships::Column::JoinedAt)
            .order_by_asc(group_memberships::Column::UserId)
            .all(db)
            .await?;

        let mut order: Vec<String> = memberships.into_iter().map(|m| m.user_id).collect();
        let mut totals: HashMap<String, (Money, Money)> =
            order.iter().map(|id| (id.clone(), (Money::ZERO, Money::ZERO))).collect();

        let entries = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id.to_string()))
            .filter(expenses::Column::VoidedAt.is_null())
            .order_by_asc(expenses::Column::OccurredAt)
            .all(db)
            .await?;
        for entry in entries {
            if !totals.contains_key(&entry.paid_by) {
                order.push(entry.paid_by.clone());
            }
            accumulate(&mut totals.entry(entry.paid_by).or_default().0, entry.amount_minor)?;
        }

        let shares = expense_shares::Entity::find()
            .join(JoinType::InnerJoin, expense_shares::Relation::Expenses.def())
            .filter(expenses::Column::GroupId.eq(group_id.to_string()))
            .filter(expenses::Column::VoidedAt.is_null())
            .all(db)
            .await?;
        for share in shares {
            if !totals.contains_key(&share.user_id) {
                order.push(share.user_id.clone());
            }
            accumulate(&mut totals.entry(share.user_id).or_default().1, share.amount_minor)?;
        }

        order
            .into_iter()
            .map(|user_id| {
                let (paid, owed) = totals.get(&user_id).copied().unwrap_or_default();
                MemberBalance::new(user_id, paid, owed)
            })
            .collect()
    }

    /// What each member paid, owes and nets in a group (member-only).
    pub async fn group_balances(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<MemberBalance>> {
        self.require_group_member(&self.database, group_id, user_id)
            .await?;
        self.ledger_balances(&self.database, group_id).await
    }

    /// Suggested repayments that bring every balance back to zero.
    pub async fn settle_up(&self, group_id: &str, user_id: &str) -> ResultEngine<Vec<Transfer>> {
        let balances = self.group_balances(group_id, user_id).await?;
        let transfers = simplify_debts(&balances);
        tracing::debug!(
            "settle up for group {group_id}: {} transfers for {} members",
            transfers.len(),
            balances.len()
        );
        Ok(transfers)
    }
}
