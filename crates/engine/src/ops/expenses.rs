use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseCmd, ExpenseKind, ExpenseListFilter, ResultEngine,
    SettlementCmd, Share, compute_shares, expense_shares, expenses,
    util::{ensure_group_currency, normalize_description, normalize_optional_text},
};

use super::{Engine, with_tx};

const SETTLEMENT_DESCRIPTION: &str = "Remboursement";

impl Engine {
    /// Logs an expense and its shares.
    pub async fn add_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Uuid> {
        let description = normalize_description(&cmd.description)?;
        let shares = compute_shares(cmd.amount_minor, &cmd.split)?;
        let paid_by = cmd.paid_by.clone().unwrap_or_else(|| cmd.user_id.clone());

        with_tx!(self, |db_tx| {
            let (group, _) = self
                .require_group_member(&db_tx, &cmd.group_id, &cmd.user_id)
                .await?;
            let currency = group.currency()?;
            if let Some(requested) = cmd.currency {
                ensure_group_currency(currency, requested)?;
            }

            let mut involved = vec![paid_by.as_str()];
            involved.extend(cmd.split.participants());
            self.require_members(&db_tx, &cmd.group_id, &involved).await?;

            let mut expense = Expense::new(
                cmd.group_id.clone(),
                ExpenseKind::Expense,
                description.clone(),
                cmd.amount_minor,
                currency,
                paid_by.clone(),
                cmd.occurred_at,
                cmd.user_id.clone(),
            )?;
            expense.shares = shares.clone();
            self.insert_expense(&db_tx, &expense).await?;

            tracing::info!(
                "expense {} of {} in group {} paid by {paid_by}",
                expense.id,
                expense.amount_minor,
                expense.group_id
            );
            Ok(expense.id)
        })
    }

    /// Records a repayment from one member to another.
    ///
    /// Stored as a ledger entry paid by the sender with a single share owed
    /// by the recipient: the sender's debt shrinks, and so does the credit of
    /// the recipient.
    pub async fn record_settlement(&self, cmd: SettlementCmd) -> ResultEngine<Uuid> {
        if cmd.from_user_id == cmd.to_user_id {
            return Err(EngineError::InvalidSplit(
                "a settlement needs two different members".to_string(),
            ));
        }
        let description = match normalize_optional_text(cmd.note.as_deref()) {
            Some(note) => normalize_description(&note)?,
            None => SETTLEMENT_DESCRIPTION.to_string(),
        };

        with_tx!(self, |db_tx| {
            let (group, _) = self
                .require_group_member(&db_tx, &cmd.group_id, &cmd.user_id)
                .await?;
            self.require_members(
                &db_tx,
                &cmd.group_id,
                &[cmd.from_user_id.as_str(), cmd.to_user_id.as_str()],
            )
            .await?;

            let mut expense = Expense::new(
                cmd.group_id.clone(),
                ExpenseKind::Settlement,
                description.clone(),
                cmd.amount_minor,
                group.currency()?,
                cmd.from_user_id.clone(),
                cmd.occurred_at,
                cmd.user_id.clone(),
            )?;
            expense.shares = vec![Share::new(cmd.to_user_id.clone(), cmd.amount_minor)];
            self.insert_expense(&db_tx, &expense).await?;

            tracing::info!(
                "settlement {} of {} from {} to {}",
                expense.id,
                expense.amount_minor,
                cmd.from_user_id,
                cmd.to_user_id
            );
            Ok(expense.id)
        })
    }

    async fn insert_expense(
        &self,
        db: &sea_orm::DatabaseTransaction,
        expense: &Expense,
    ) -> ResultEngine<()> {
        expenses::ActiveModel::from(expense).insert(db).await?;
        let rows: Vec<expense_shares::ActiveModel> = expense
            .shares
            .iter()
            .map(|share| expense_shares::ActiveModel::for_share(expense.id, share))
            .collect();
        expense_shares::Entity::insert_many(rows).exec(db).await?;
        Ok(())
    }

    /// Ledger entries of a group, newest first, with their shares.
    pub async fn list_expenses(
        &self,
        group_id: &str,
        user_id: &str,
        filter: &ExpenseListFilter,
    ) -> ResultEngine<Vec<Expense>> {
        self.require_group_member(&self.database, group_id, user_id)
            .await?;

        let mut query = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id.to_string()));
        if !filter.include_voided {
            query = query.filter(expenses::Column::VoidedAt.is_null());
        }
        if let Some(kind) = filter.kind {
            query = query.filter(expenses::Column::Kind.eq(kind.as_str()));
        }
        let models = query
            .order_by_desc(expenses::Column::OccurredAt)
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(filter.effective_limit())
            .all(&self.database)
            .await?;

        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
        let mut shares_by_expense: HashMap<String, Vec<Share>> = HashMap::new();
        if !ids.is_empty() {
            let share_models = expense_shares::Entity::find()
                .filter(expense_shares::Column::ExpenseId.is_in(ids))
                .order_by_asc(expense_shares::Column::ExpenseId)
                .all(&self.database)
                .await?;
            for model in share_models {
                shares_by_expense
                    .entry(model.expense_id.clone())
                    .or_default()
                    .push(Share::from(model));
            }
        }

        models
            .into_iter()
            .map(|model| {
                let shares = shares_by_expense.remove(&model.id).unwrap_or_default();
                let mut expense = Expense::try_from(model)?;
                expense.shares = shares;
                Ok(expense)
            })
            .collect()
    }

    /// A single ledger entry with its shares (member-only).
    pub async fn expense(
        &self,
        group_id: &str,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        self.require_group_member(&self.database, group_id, user_id)
            .await?;
        let model = self
            .find_expense(&self.database, group_id, expense_id)
            .await?;
        let shares = model
            .find_related(expense_shares::Entity)
            .all(&self.database)
            .await?;

        let mut expense = Expense::try_from(model)?;
        expense.shares = shares.into_iter().map(Share::from).collect();
        Ok(expense)
    }

    async fn find_expense<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
        expense_id: Uuid,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::GroupId.eq(group_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))
    }

    /// Soft-deletes a ledger entry.
    ///
    /// Allowed for whoever logged it, whoever paid it, and the group owner.
    pub async fn void_expense(
        &self,
        group_id: &str,
        expense_id: Uuid,
        user_id: &str,
        voided_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (_, role) = self.require_group_member(&db_tx, group_id, user_id).await?;
            let model = self.find_expense(&db_tx, group_id, expense_id).await?;

            if model.voided_at.is_some() {
                return Err(EngineError::InvalidAmount(
                    "expense already voided".to_string(),
                ));
            }
            if model.created_by != user_id && model.paid_by != user_id && !role.can_manage() {
                return Err(EngineError::Forbidden(
                    "only the author, the payer or the group owner can void an expense"
                        .to_string(),
                ));
            }

            expenses::ActiveModel {
                id: ActiveValue::Set(model.id),
                voided_at: ActiveValue::Set(Some(voided_at)),
                voided_by: ActiveValue::Set(Some(user_id.to_string())),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            tracing::info!("expense {expense_id} voided by {user_id}");
            Ok(())
        })
    }
}
