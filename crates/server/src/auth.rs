//! Passwordless login endpoints

use api_types::auth::{LoginRequest, LoginResponse, SessionResponse, VerifyRequest};
use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use engine::LoginForm;

use crate::{
    ServerError, extract::JsonBody, mapping::user_view,
    server::{ServerState, SessionToken},
};

/// Issues a login code for the submitted address.
///
/// The code is mailed in production; here it is logged, and echoed back
/// only when the server runs with `expose_login_code`.
pub async fn login(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let challenge = state
        .engine
        .request_login_code(&LoginForm::new(payload.email))
        .await?;

    tracing::info!(
        "login code for {}: {} (valid until {})",
        challenge.user.email,
        challenge.code,
        challenge.expires_at
    );

    Ok(Json(LoginResponse {
        email: challenge.user.email,
        expires_at: challenge.expires_at,
        code: state.config.expose_login_code.then_some(challenge.code),
    }))
}

pub async fn verify(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<VerifyRequest>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = state
        .engine
        .verify_login_code(&payload.email, &payload.code)
        .await?;

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: user_view(&session.user),
    }))
}

pub async fn logout(
    Extension(token): Extension<SessionToken>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.logout(&token.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
