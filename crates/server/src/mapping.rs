//! Conversions between engine values and API bodies.

use api_types::{
    balance::{BalanceView, TransferView},
    expense::{ExpenseKind as ApiKind, ExpenseView, ShareView, SplitInput},
    group::{GroupSummaryView, GroupView},
    member::{GroupRole as ApiRole, MemberView},
    user::UserView,
};
use chrono::{DateTime, FixedOffset, Utc};
use engine::{Locale, Money};

pub(crate) fn currency_to_api(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Gbp => api_types::Currency::Gbp,
        engine::Currency::Chf => api_types::Currency::Chf,
        engine::Currency::Cad => api_types::Currency::Cad,
    }
}

pub(crate) fn currency_from_api(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Gbp => engine::Currency::Gbp,
        api_types::Currency::Chf => engine::Currency::Chf,
        api_types::Currency::Cad => engine::Currency::Cad,
    }
}

pub(crate) fn role_to_api(role: engine::GroupRole) -> ApiRole {
    match role {
        engine::GroupRole::Owner => ApiRole::Owner,
        engine::GroupRole::Member => ApiRole::Member,
    }
}

pub(crate) fn kind_to_api(kind: engine::ExpenseKind) -> ApiKind {
    match kind {
        engine::ExpenseKind::Expense => ApiKind::Expense,
        engine::ExpenseKind::Settlement => ApiKind::Settlement,
    }
}

pub(crate) fn kind_from_api(kind: ApiKind) -> engine::ExpenseKind {
    match kind {
        ApiKind::Expense => engine::ExpenseKind::Expense,
        ApiKind::Settlement => engine::ExpenseKind::Settlement,
    }
}

/// Client timestamp in UTC, or now.
pub(crate) fn utc_or_now(value: Option<DateTime<FixedOffset>>) -> DateTime<Utc> {
    value.map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
}

/// Maps a split request; `members` fills an equal split without participants.
pub(crate) fn split_from_api(split: SplitInput, members: impl FnOnce() -> Vec<String>) -> engine::SplitMode {
    match split {
        SplitInput::Equal { participants } => {
            engine::SplitMode::equal(participants.unwrap_or_else(members))
        }
        SplitInput::Exact { shares } => engine::SplitMode::Exact {
            shares: shares
                .into_iter()
                .map(|s| engine::Share::new(s.user_id, s.amount_minor))
                .collect(),
        },
        SplitInput::Weighted { weights } => engine::SplitMode::Weighted {
            weights: weights
                .into_iter()
                .map(|w| engine::Weight {
                    user_id: w.user_id,
                    weight: w.weight,
                })
                .collect(),
        },
    }
}

pub(crate) fn user_view(user: &engine::User) -> UserView {
    UserView {
        id: user.id.clone(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        label: user.label().to_string(),
    }
}

pub(crate) fn member_view(member: &engine::Member) -> MemberView {
    MemberView {
        user: user_view(&member.user),
        role: role_to_api(member.role),
        joined_at: member.joined_at,
    }
}

pub(crate) fn group_view(group: &engine::Group) -> GroupView {
    GroupView {
        id: group.id.clone(),
        name: group.name.clone(),
        currency: currency_to_api(group.currency),
        created_by: group.created_by.clone(),
        created_at: group.created_at,
        members: group.members.iter().map(member_view).collect(),
    }
}

pub(crate) fn group_summary_view(summary: engine::GroupSummary) -> GroupSummaryView {
    GroupSummaryView {
        id: summary.id,
        name: summary.name,
        currency: currency_to_api(summary.currency),
        role: role_to_api(summary.role),
        member_count: summary.member_count,
    }
}

pub(crate) fn expense_view(expense: engine::Expense, locale: Locale) -> ExpenseView {
    let currency = expense.currency;
    ExpenseView {
        id: expense.id,
        kind: kind_to_api(expense.kind),
        description: expense.description,
        amount_minor: expense.amount_minor,
        amount_display: Money::new(expense.amount_minor).format(currency, locale),
        currency: currency_to_api(currency),
        paid_by: expense.paid_by,
        occurred_at: expense.occurred_at,
        created_by: expense.created_by,
        created_at: expense.created_at,
        voided: expense.voided_at.is_some(),
        voided_at: expense.voided_at,
        shares: expense
            .shares
            .into_iter()
            .map(|share| ShareView {
                amount_display: Money::new(share.amount_minor).format(currency, locale),
                user_id: share.user_id,
                amount_minor: share.amount_minor,
            })
            .collect(),
    }
}

pub(crate) fn balance_view(
    balance: engine::MemberBalance,
    currency: engine::Currency,
    locale: Locale,
) -> BalanceView {
    BalanceView {
        net_display: Money::new(balance.net_minor).format(currency, locale),
        user_id: balance.user_id,
        paid_minor: balance.paid_minor,
        owed_minor: balance.owed_minor,
        net_minor: balance.net_minor,
    }
}

pub(crate) fn transfer_view(
    transfer: engine::Transfer,
    currency: engine::Currency,
    locale: Locale,
) -> TransferView {
    TransferView {
        amount_display: Money::new(transfer.amount_minor).format(currency, locale),
        from_user_id: transfer.from_user_id,
        to_user_id: transfer.to_user_id,
        amount_minor: transfer.amount_minor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currencies_map_both_ways() {
        for currency in engine::Currency::ALL {
            assert_eq!(currency_from_api(currency_to_api(currency)), currency);
        }
    }

    #[test]
    fn equal_split_without_participants_uses_members() {
        let split = split_from_api(SplitInput::Equal { participants: None }, || {
            vec!["a".to_string(), "b".to_string()]
        });
        assert_eq!(split, engine::SplitMode::equal(["a", "b"]));
    }

    #[test]
    fn expense_amounts_are_displayed_with_the_locale() {
        let mut expense = engine::Expense::new(
            "g".to_string(),
            engine::ExpenseKind::Expense,
            "Pizza".to_string(),
            1050,
            engine::Currency::Eur,
            "alice".to_string(),
            Utc::now(),
            "alice".to_string(),
        )
        .unwrap();
        expense.shares = vec![engine::Share::new("bob", 1050)];

        let view = expense_view(expense, Locale::FrFr);
        assert_eq!(view.amount_display, "10,50\u{a0}€");
        assert_eq!(view.shares[0].amount_display, "10,50\u{a0}€");
        assert!(!view.voided);
    }
}
