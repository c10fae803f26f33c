//! Shared-expense ledger: groups of people log who paid what, the engine
//! keeps per-member balances and proposes how to settle up.

pub use commands::{ExpenseCmd, ExpenseListFilter, SettlementCmd};
pub use currency::{Currency, Locale};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseKind};
pub use group_memberships::GroupRole;
pub use groups::{Group, GroupSummary, Member};
pub use money::{Money, format_currency};
pub use ops::{Engine, EngineBuilder, LOGIN_CODE_MAX_ATTEMPTS, LoginChallenge, Session};
pub use settlement::{MemberBalance, Transfer, simplify_debts};
pub use split::{Share, SplitMode, Weight, compute_shares};
pub use users::User;
pub use validation::{
    EMAIL_INVALID, EMAIL_REQUIRED, Email, FieldError, Login, LoginForm, ValidationErrors,
};

mod commands;
mod currency;
mod error;
mod expense_shares;
mod expenses;
mod group_memberships;
mod groups;
mod money;
mod ops;
mod sessions;
mod settlement;
mod split;
mod users;
mod util;
mod validation;

pub type ResultEngine<T> = Result<T, EngineError>;
