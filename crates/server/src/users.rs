//! Current user endpoints

use api_types::user::{ProfileUpdate, UserView};
use axum::{Extension, Json, extract::State};
use axum_extra::extract::WithRejection;

use crate::{ServerError, extract::JsonBody, mapping::user_view, server::ServerState};

pub async fn me(Extension(user): Extension<engine::User>) -> Json<UserView> {
    Json(user_view(&user))
}

pub async fn update_me(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<ProfileUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .update_profile(&user.id, payload.display_name.as_deref())
        .await?;
    Ok(Json(user_view(&user)))
}
