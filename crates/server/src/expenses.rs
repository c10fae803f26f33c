//! Group ledger endpoints: expenses and settlements

use api_types::expense::{
    ExpenseCreated, ExpenseList, ExpenseListResponse, ExpenseNew, ExpenseView, ExpenseVoid,
    SettlementNew,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use engine::{ExpenseCmd, ExpenseListFilter, SettlementCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{JsonBody, PathParams, QueryParams},
    mapping::{currency_from_api, expense_view, kind_from_api, split_from_api, utc_or_now},
    server::ServerState,
};

pub async fn list(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
    WithRejection(Query(query), _): QueryParams<ExpenseList>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let filter = ExpenseListFilter {
        limit: query.limit,
        include_voided: query.include_voided.unwrap_or(false),
        kind: query.kind.map(kind_from_api),
    };

    let expenses = state
        .engine
        .list_expenses(&group_id, &user.id, &filter)
        .await?;

    let locale = state.config.locale;
    Ok(Json(ExpenseListResponse {
        expenses: expenses
            .into_iter()
            .map(|expense| expense_view(expense, locale))
            .collect(),
    }))
}

pub async fn expense_new(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
    WithRejection(Json(payload), _): JsonBody<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let engine = &state.engine;

    // An equal split without participants goes to every current member.
    let members = match &payload.split {
        api_types::expense::SplitInput::Equal { participants: None } => engine
            .group(&group_id, &user.id)
            .await?
            .members
            .into_iter()
            .map(|m| m.user.id)
            .collect(),
        _ => Vec::new(),
    };
    let split = split_from_api(payload.split, || members);

    let mut cmd = ExpenseCmd::new(
        &group_id,
        &user.id,
        payload.description,
        payload.amount_minor,
        split,
        utc_or_now(payload.occurred_at),
    );
    if let Some(paid_by) = payload.paid_by {
        cmd = cmd.paid_by(paid_by);
    }
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(currency_from_api(currency));
    }

    let id = engine.add_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(ExpenseCreated { id })))
}

pub async fn get(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path((group_id, expense_id)), _): PathParams<(String, Uuid)>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state
        .engine
        .expense(&group_id, expense_id, &user.id)
        .await?;
    Ok(Json(expense_view(expense, state.config.locale)))
}

pub async fn void_expense(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path((group_id, expense_id)), _): PathParams<(String, Uuid)>,
    payload: Result<Json<ExpenseVoid>, JsonRejection>,
) -> Result<StatusCode, ServerError> {
    let voided_at = match payload {
        Ok(Json(body)) => body.voided_at,
        // The body is optional.
        Err(JsonRejection::MissingJsonContentType(_)) => None,
        Err(rejection) => return Err(rejection.into()),
    };
    state
        .engine
        .void_expense(&group_id, expense_id, &user.id, utc_or_now(voided_at))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn settlement_new(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
    WithRejection(Json(payload), _): JsonBody<SettlementNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let from = payload.from_user_id.unwrap_or_else(|| user.id.clone());
    let mut cmd = SettlementCmd::new(
        &group_id,
        &user.id,
        from,
        payload.to_user_id,
        payload.amount_minor,
        utc_or_now(payload.occurred_at),
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let id = state.engine.record_settlement(cmd).await?;
    Ok((StatusCode::CREATED, Json(ExpenseCreated { id })))
}
