use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
    Cad,
}

pub mod auth {
    use super::*;

    /// Body of `POST /auth/login`.
    ///
    /// A missing field deserializes to an empty string so the schema can
    /// answer with its own message instead of a JSON error.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LoginRequest {
        #[serde(default)]
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub email: String,
        pub expires_at: DateTime<Utc>,
        /// Only present when the server runs with `expose_login_code`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub code: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VerifyRequest {
        pub email: String,
        pub code: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionResponse {
        /// Bearer token for the `Authorization` header.
        pub token: String,
        pub expires_at: DateTime<Utc>,
        pub user: super::user::UserView,
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub id: String,
        pub email: String,
        pub display_name: Option<String>,
        /// Display name, or the email when there is none.
        pub label: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        /// Empty or absent clears the display name.
        pub display_name: Option<String>,
    }
}

pub mod member {
    use super::*;

    /// Role of a user in a group.
    ///
    /// - `owner`: manages members, renames or deletes the group.
    /// - `member`: logs expenses and settlements.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GroupRole {
        Owner,
        Member,
    }

    /// Request body for adding a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        #[serde(default)]
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user: super::user::UserView,
        pub role: GroupRole,
        pub joined_at: DateTime<Utc>,
    }
}

pub mod group {
    use super::*;
    use crate::member::{GroupRole, MemberView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        /// Defaults to EUR.
        pub currency: Option<Currency>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupCreated {
        pub id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupSummaryView {
        pub id: String,
        pub name: String,
        pub currency: Currency,
        pub role: GroupRole,
        pub member_count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupListResponse {
        pub groups: Vec<GroupSummaryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: String,
        pub name: String,
        pub currency: Currency,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub members: Vec<MemberView>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseKind {
        Expense,
        Settlement,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ShareInput {
        pub user_id: String,
        pub amount_minor: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct WeightInput {
        pub user_id: String,
        pub weight: u32,
    }

    /// How an expense is divided.
    ///
    /// ```json
    /// { "mode": "equal" }
    /// { "mode": "equal", "participants": ["<user id>", "<user id>"] }
    /// { "mode": "exact", "shares": [{ "user_id": "...", "amount_minor": 1250 }] }
    /// { "mode": "weighted", "weights": [{ "user_id": "...", "weight": 2 }] }
    /// ```
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "mode", rename_all = "snake_case")]
    pub enum SplitInput {
        /// Without participants, every current member takes part.
        Equal {
            #[serde(default)]
            participants: Option<Vec<String>>,
        },
        Exact {
            shares: Vec<ShareInput>,
        },
        Weighted {
            weights: Vec<WeightInput>,
        },
    }

    impl Default for SplitInput {
        fn default() -> Self {
            Self::Equal { participants: None }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        /// Must be > 0.
        pub amount_minor: i64,
        /// When set, must be the group currency.
        pub currency: Option<Currency>,
        /// Defaults to the caller.
        pub paid_by: Option<String>,
        #[serde(default)]
        pub split: SplitInput,
        /// RFC3339 timestamp, including timezone offset. Defaults to now.
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    /// Query string of `GET /groups/{group_id}/expenses`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub limit: Option<u64>,
        pub include_voided: Option<bool>,
        pub kind: Option<ExpenseKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareView {
        pub user_id: String,
        pub amount_minor: i64,
        pub amount_display: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub kind: ExpenseKind,
        pub description: String,
        pub amount_minor: i64,
        /// Formatted with the server locale, e.g. `"10,50 €"`.
        pub amount_display: String,
        pub currency: Currency,
        pub paid_by: String,
        pub occurred_at: DateTime<Utc>,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub voided: bool,
        pub voided_at: Option<DateTime<Utc>>,
        pub shares: Vec<ShareView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseVoid {
        /// Optional: if absent, server uses now().
        pub voided_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        /// Defaults to the caller.
        pub from_user_id: Option<String>,
        pub to_user_id: String,
        pub amount_minor: i64,
        pub note: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub user_id: String,
        pub paid_minor: i64,
        pub owed_minor: i64,
        /// Positive: the group owes this member. Negative: the member owes.
        pub net_minor: i64,
        pub net_display: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub currency: Currency,
        pub balances: Vec<BalanceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from_user_id: String,
        pub to_user_id: String,
        pub amount_minor: i64,
        pub amount_display: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleUpResponse {
        pub currency: Currency,
        pub transfers: Vec<TransferView>,
    }
}
