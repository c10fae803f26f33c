use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use engine::{Engine, EngineError, Locale};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use std::sync::Arc;

use crate::{
    ServerError, auth, balances, cors::{CorsMode, cors_layer}, expenses, groups, members, users,
};

/// Settings the HTTP layer needs at runtime.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Origin of the browser front-end, e.g. `http://localhost:5173`.
    pub frontend_url: String,
    pub cors: CorsMode,
    /// Locale of the `*_display` amounts.
    pub locale: Locale,
    /// Return login codes in the response body instead of only logging them.
    pub expose_login_code: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            frontend_url: "http://localhost:5173".to_string(),
            cors: CorsMode::default(),
            locale: Locale::default(),
            expose_login_code: false,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub config: Arc<ServerConfig>,
}

/// Bearer token of the current request, for logout.
#[derive(Clone, Debug)]
pub(crate) struct SessionToken(pub String);

async fn require_session(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(EngineError::Unauthorized("missing bearer token".to_string()).into());
    };

    let user = state.engine.authenticate(bearer.token()).await?;

    request
        .extensions_mut()
        .insert(SessionToken(bearer.token().to_string()));
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Full application router: public routes, bearer-protected routes, tracing
/// and CORS.
pub fn router(state: ServerState) -> Router {
    let cors = cors_layer(&state.config.frontend_url, state.config.cors);

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/me", get(users::me).patch(users::update_me))
        .route("/groups", get(groups::list).post(groups::group_new))
        .route(
            "/groups/{group_id}",
            get(groups::get)
                .patch(groups::rename)
                .delete(groups::delete),
        )
        .route("/groups/{group_id}/members", post(members::add))
        .route(
            "/groups/{group_id}/members/{user_id}",
            axum::routing::delete(members::remove),
        )
        .route(
            "/groups/{group_id}/expenses",
            get(expenses::list).post(expenses::expense_new),
        )
        .route("/groups/{group_id}/expenses/{expense_id}", get(expenses::get))
        .route(
            "/groups/{group_id}/expenses/{expense_id}/void",
            post(expenses::void_expense),
        )
        .route("/groups/{group_id}/settlements", post(expenses::settlement_new))
        .route("/groups/{group_id}/balances", get(balances::balances))
        .route("/groups/{group_id}/settle-up", get(balances::settle_up))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify", post(auth::verify))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(
        "Server listening on {}, front-end {} ({:?} CORS)",
        addr,
        config.frontend_url,
        config.cors
    );

    let state = ServerState {
        engine: Arc::new(engine),
        config: Arc::new(config),
    };

    axum::serve(listener, router(state)).await
}
