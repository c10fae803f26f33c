//! Balance and settle-up endpoints

use api_types::balance::{BalancesResponse, SettleUpResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;

use crate::{
    ServerError,
    extract::PathParams,
    mapping::{balance_view, currency_to_api, transfer_view},
    server::ServerState,
};

pub async fn balances(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let engine = &state.engine;
    let locale = state.config.locale;

    let group = engine.group(&group_id, &user.id).await?;
    let balances = engine.group_balances(&group_id, &user.id).await?;

    Ok(Json(BalancesResponse {
        currency: currency_to_api(group.currency),
        balances: balances
            .into_iter()
            .map(|b| balance_view(b, group.currency, locale))
            .collect(),
    }))
}

pub async fn settle_up(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
) -> Result<Json<SettleUpResponse>, ServerError> {
    let engine = &state.engine;
    let locale = state.config.locale;

    let group = engine.group(&group_id, &user.id).await?;
    let transfers = engine.settle_up(&group_id, &user.id).await?;

    Ok(Json(SettleUpResponse {
        currency: currency_to_api(group.currency),
        transfers: transfers
            .into_iter()
            .map(|t| transfer_view(t, group.currency, locale))
            .collect(),
    }))
}
