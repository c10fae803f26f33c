//! Command structs for engine operations.
//!
//! These types group parameters for ledger writes (expenses, settlements)
//! and list queries, keeping call sites readable and avoiding long argument
//! lists.

use chrono::{DateTime, Utc};

use crate::{Currency, ExpenseKind, SplitMode};

/// Log an expense paid by one member and split among several.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub group_id: String,
    pub description: String,
    pub amount_minor: i64,
    /// When set, must equal the group currency.
    pub currency: Option<Currency>,
    /// Defaults to the caller.
    pub paid_by: Option<String>,
    pub split: SplitMode,
    pub occurred_at: DateTime<Utc>,
    pub user_id: String,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        description: impl Into<String>,
        amount_minor: i64,
        split: SplitMode,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            description: description.into(),
            amount_minor,
            currency: None,
            paid_by: None,
            split,
            occurred_at,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn paid_by(mut self, paid_by: impl Into<String>) -> Self {
        self.paid_by = Some(paid_by.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }
}

/// Record that one member paid another back.
#[derive(Clone, Debug)]
pub struct SettlementCmd {
    pub group_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub user_id: String,
}

impl SettlementCmd {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        user_id: impl Into<String>,
        from_user_id: impl Into<String>,
        to_user_id: impl Into<String>,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            amount_minor,
            note: None,
            occurred_at,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Filters for listing a group's ledger.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub limit: Option<u64>,
    pub include_voided: bool,
    pub kind: Option<ExpenseKind>,
}

impl ExpenseListFilter {
    pub const DEFAULT_LIMIT: u64 = 50;
    pub const MAX_LIMIT: u64 = 200;

    /// Requested limit clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_defaulted_and_clamped() {
        assert_eq!(ExpenseListFilter::default().effective_limit(), 50);
        let filter = ExpenseListFilter {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 200);
        let filter = ExpenseListFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 1);
    }
}
