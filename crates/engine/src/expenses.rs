//! Ledger entries of a group.
//!
//! Every money movement inside a group is an [`Expense`]: one member pays
//! `amount_minor` and the amount is spread over [`Share`]s owed by members.
//! A repayment between two members is an expense of kind
//! [`ExpenseKind::Settlement`] with a single share owed by the recipient, so
//! balances are always computed the same way:
//!
//! `net = paid - owed`
//!
//! Voided entries stay in the table and are ignored by balances.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine, Share,
    money::ensure_expense_amount,
    util::{model_currency, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    Expense,
    Settlement,
}

impl ExpenseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Settlement => "settlement",
        }
    }
}

impl TryFrom<&str> for ExpenseKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "settlement" => Ok(Self::Settlement),
            other => Err(EngineError::InvalidId(format!(
                "invalid expense kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: String,
    pub kind: ExpenseKind,
    pub description: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub paid_by: String,
    pub occurred_at: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_by: Option<String>,
    pub shares: Vec<Share>,
}

impl Expense {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        group_id: String,
        kind: ExpenseKind,
        description: String,
        amount_minor: i64,
        currency: Currency,
        paid_by: String,
        occurred_at: DateTime<Utc>,
        created_by: String,
    ) -> ResultEngine<Self> {
        ensure_expense_amount(amount_minor)?;
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            kind,
            description,
            amount_minor,
            currency,
            paid_by,
            occurred_at,
            created_by,
            created_at: Utc::now(),
            voided_at: None,
            voided_by: None,
            shares: Vec::new(),
        })
    }

    #[must_use]
    pub fn is_voided(&self) -> bool {
        self.voided_at.is_some()
    }

    /// Share owed by `user_id`, zero when not a participant.
    #[must_use]
    pub fn share_of(&self, user_id: &str) -> i64 {
        self.shares
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.amount_minor)
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub kind: String,
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub paid_by: String,
    pub occurred_at: DateTimeUtc,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub voided_at: Option<DateTimeUtc>,
    pub voided_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::expense_shares::Entity")]
    Shares,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::expense_shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.clone()),
            kind: ActiveValue::Set(expense.kind.as_str().to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount_minor),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            paid_by: ActiveValue::Set(expense.paid_by.clone()),
            occurred_at: ActiveValue::Set(expense.occurred_at),
            created_by: ActiveValue::Set(expense.created_by.clone()),
            created_at: ActiveValue::Set(expense.created_at),
            voided_at: ActiveValue::Set(expense.voided_at),
            voided_by: ActiveValue::Set(expense.voided_by.clone()),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            group_id: model.group_id,
            kind: ExpenseKind::try_from(model.kind.as_str())?,
            description: model.description,
            amount_minor: model.amount_minor,
            currency: model_currency(&model.currency)?,
            paid_by: model.paid_by,
            occurred_at: model.occurred_at,
            created_by: model.created_by,
            created_at: model.created_at,
            voided_at: model.voided_at,
            voided_by: model.voided_by,
            shares: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amounts() {
        let err = Expense::new(
            "g".to_string(),
            ExpenseKind::Expense,
            "Pizza".to_string(),
            0,
            Currency::Eur,
            "alice".to_string(),
            Utc::now(),
            "alice".to_string(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must be > 0".to_string())
        );
    }

    #[test]
    fn model_round_trip_keeps_kind_and_currency() {
        let expense = Expense::new(
            "g".to_string(),
            ExpenseKind::Settlement,
            "Repayment".to_string(),
            1250,
            Currency::Gbp,
            "bob".to_string(),
            Utc::now(),
            "bob".to_string(),
        )
        .unwrap();
        let model = Model {
            id: expense.id.to_string(),
            group_id: expense.group_id.clone(),
            kind: expense.kind.as_str().to_string(),
            description: expense.description.clone(),
            amount_minor: expense.amount_minor,
            currency: expense.currency.code().to_string(),
            paid_by: expense.paid_by.clone(),
            occurred_at: expense.occurred_at,
            created_by: expense.created_by.clone(),
            created_at: expense.created_at,
            voided_at: None,
            voided_by: None,
        };
        assert_eq!(Expense::try_from(model).unwrap(), expense);
    }

    #[test]
    fn share_of_sums_matching_shares() {
        let mut expense = Expense::new(
            "g".to_string(),
            ExpenseKind::Expense,
            "Groceries".to_string(),
            900,
            Currency::Eur,
            "alice".to_string(),
            Utc::now(),
            "alice".to_string(),
        )
        .unwrap();
        expense.shares = vec![Share::new("alice", 450), Share::new("bob", 450)];
        assert_eq!(expense.share_of("bob"), 450);
        assert_eq!(expense.share_of("carol"), 0);
    }
}
