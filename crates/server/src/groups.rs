//! Group API endpoints

use api_types::group::{GroupCreated, GroupListResponse, GroupNew, GroupUpdate, GroupView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::{
    ServerError,
    extract::{JsonBody, PathParams},
    mapping::{currency_from_api, group_summary_view, group_view},
    server::ServerState,
};

/// Handle requests for creating a new group
pub async fn group_new(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<GroupNew>,
) -> Result<(StatusCode, Json<GroupCreated>), ServerError> {
    let id = state
        .engine
        .new_group(&payload.name, payload.currency.map(currency_from_api), &user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(GroupCreated { id })))
}

/// Handle requests for listing the caller's groups
pub async fn list(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
) -> Result<Json<GroupListResponse>, ServerError> {
    let groups = state.engine.list_groups(&user.id).await?;
    Ok(Json(GroupListResponse {
        groups: groups.into_iter().map(group_summary_view).collect(),
    }))
}

pub async fn get(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state.engine.group(&group_id, &user.id).await?;
    Ok(Json(group_view(&group)))
}

pub async fn rename(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
    WithRejection(Json(payload), _): JsonBody<GroupUpdate>,
) -> Result<Json<GroupView>, ServerError> {
    let engine = &state.engine;
    engine
        .rename_group(&group_id, &payload.name, &user.id)
        .await?;
    let group = engine.group(&group_id, &user.id).await?;
    Ok(Json(group_view(&group)))
}

pub async fn delete(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(&group_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
