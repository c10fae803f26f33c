use std::collections::BTreeMap;

use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use cors::{CorsMode, cors_layer};
pub use server::{ServerConfig, ServerState, router, run_with_listener};

mod auth;
mod balances;
mod cors;
mod expenses;
mod extract;
mod groups;
mod mapping;
mod members;
mod server;
mod users;

pub mod types {
    pub mod auth {
        pub use api_types::auth::{LoginRequest, LoginResponse, SessionResponse, VerifyRequest};
    }

    pub mod user {
        pub use api_types::user::{ProfileUpdate, UserView};
    }

    pub mod group {
        pub use api_types::group::{
            GroupCreated, GroupListResponse, GroupNew, GroupSummaryView, GroupUpdate, GroupView,
        };
        pub use api_types::member::{GroupRole, MemberAdd, MemberView};
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseCreated, ExpenseKind, ExpenseList, ExpenseListResponse, ExpenseNew,
            ExpenseView, ExpenseVoid, SettlementNew, ShareInput, ShareView, SplitInput,
            WeightInput,
        };
    }

    pub mod balance {
        pub use api_types::balance::{BalanceView, BalancesResponse, SettleUpResponse, TransferView};
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// A body, path or query the extractors could not parse.
    Rejection { status: StatusCode, message: String },
}

/// JSON body of every error response.
#[derive(Serialize)]
struct Error {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, String>>,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidSplit(_)
        | EngineError::InvalidCurrency(_)
        | EngineError::CurrencyMismatch(_)
        | EngineError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn body_for_engine_error(err: EngineError) -> Error {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            Error {
                error: "internal server error".to_string(),
                fields: None,
            }
        }
        EngineError::Validation(errors) => {
            let mut fields = BTreeMap::new();
            for field_error in &errors.errors {
                // First message wins for a field.
                fields
                    .entry(field_error.field.clone())
                    .or_insert_with(|| field_error.message.clone());
            }
            Error {
                error: errors.first_message().unwrap_or("invalid form").to_string(),
                fields: Some(fields),
            }
        }
        other => Error {
            error: other.to_string(),
            fields: None,
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(error) => (
                StatusCode::BAD_REQUEST,
                Error {
                    error,
                    fields: None,
                },
            ),
            ServerError::Rejection { status, message } => (
                status,
                Error {
                    error: message,
                    fields: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
