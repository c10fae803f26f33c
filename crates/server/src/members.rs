//! Group membership endpoints

use api_types::member::MemberAdd;
use api_types::user::UserView;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::{
    ServerError,
    extract::{JsonBody, PathParams},
    mapping::user_view,
    server::ServerState,
};

pub async fn add(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path(group_id), _): PathParams<String>,
    WithRejection(Json(payload), _): JsonBody<MemberAdd>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let member = state
        .engine
        .add_member(&group_id, &payload.email, &user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(user_view(&member))))
}

/// Removes a member; members may remove themselves to leave.
pub async fn remove(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Path((group_id, member_id)), _): PathParams<(String, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(&group_id, &member_id, &user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
