//! Cross-origin policy for the browser front-end.
//!
//! The front-end runs on its own origin and sends the session token, so
//! credentials are always allowed. Which origin the browser is told about
//! depends on [`CorsMode`].

use axum::http::{HeaderValue, Method, header};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorsMode {
    /// Echo the request origin only when it is the configured front-end.
    #[default]
    Strict,
    /// Always answer with the configured front-end, whatever the caller.
    Permissive,
}

/// Builds the CORS layer for `frontend_url`.
///
/// A trailing `/` is ignored: browsers never send one in `Origin`.
pub fn cors_layer(frontend_url: &str, mode: CorsMode) -> CorsLayer {
    let origin = frontend_url.trim().trim_end_matches('/').to_string();

    let allow_origin = match mode {
        CorsMode::Strict => AllowOrigin::predicate(move |request_origin: &HeaderValue, _| {
            request_origin.as_bytes() == origin.as_bytes()
        }),
        CorsMode::Permissive => match HeaderValue::from_str(&origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("frontend url {origin:?} is not a valid origin, CORS disabled");
                AllowOrigin::list([])
            }
        },
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    const FRONTEND: &str = "http://localhost:5173";

    fn app(mode: CorsMode) -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(cors_layer("http://localhost:5173/", mode))
    }

    async fn get_from(mode: CorsMode, origin: &str) -> axum::response::Response {
        app(mode)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    fn allow_origin(res: &axum::response::Response) -> Option<&str> {
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap())
    }

    fn allow_credentials(res: &axum::response::Response) -> Option<&str> {
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .map(|v| v.to_str().unwrap())
    }

    #[tokio::test]
    async fn strict_echoes_the_frontend_origin() {
        let res = get_from(CorsMode::Strict, FRONTEND).await;
        assert_eq!(allow_origin(&res), Some(FRONTEND));
        assert_eq!(allow_credentials(&res), Some("true"));
    }

    #[tokio::test]
    async fn strict_ignores_other_origins() {
        let res = get_from(CorsMode::Strict, "https://evil.example").await;
        assert_eq!(allow_origin(&res), None);
        assert_eq!(allow_credentials(&res), Some("true"));
    }

    #[tokio::test]
    async fn permissive_always_names_the_frontend() {
        let res = get_from(CorsMode::Permissive, "https://evil.example").await;
        assert_eq!(allow_origin(&res), Some(FRONTEND));
        assert_eq!(allow_credentials(&res), Some("true"));
    }

    #[tokio::test]
    async fn preflight_lists_methods_and_headers() {
        let res = app(CorsMode::Strict)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/health")
                    .header(header::ORIGIN, FRONTEND)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(allow_origin(&res), Some(FRONTEND));
        let methods = res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("PATCH"));
        let headers = res.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(headers.contains("authorization"));
        assert!(res.headers().contains_key(header::VARY));
    }
}
