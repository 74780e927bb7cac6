// Bearer extraction, request logging, and CORS middleware

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;

/// Caller's own Spotify access token, taken from the Authorization header
///
/// Expects "Bearer {token}"; the token is the second whitespace-delimited
/// segment of the header value.
#[derive(Debug, Clone, PartialEq)]
pub struct BearerToken(pub String);

/// Extract the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_whitespace()
        .nth(1)
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(token) => Ok(BearerToken(token.to_string())),
            None => {
                tracing::warn!(
                    "Missing access token: {} {}",
                    parts.method,
                    parts.uri.path()
                );
                Err(ApiError::Unauthenticated("Missing access token".to_string()))
            }
        }
    }
}

/// Request logging middleware
///
/// Tags every request with a short request id and logs its outcome.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    tracing::debug!("[{}] {} {}", request_id, method, path);

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    if status.is_server_error() {
        tracing::error!(
            "[{}] {} {} -> {} ({:.1}ms)",
            request_id,
            method,
            path,
            status.as_u16(),
            latency_ms
        );
    } else {
        tracing::info!(
            "[{}] {} {} -> {} ({:.1}ms)",
            request_id,
            method,
            path,
            status.as_u16(),
            latency_ms
        );
    }

    response
}

/// Create CORS middleware layer
///
/// Configures CORS to allow all origins, methods, and headers.
/// Handles OPTIONS preflight requests automatically.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderValue, StatusCode},
        routing::get,
        Router,
    };
    use proptest::prelude::*;
    use tower::util::ServiceExt;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn echo_token(BearerToken(token): BearerToken) -> String {
        token
    }

    fn create_test_app() -> Router {
        Router::new()
            .route("/test", get(echo_token))
            .layer(axum::middleware::from_fn(logging_middleware))
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers_with("Bearer   spaced  ")), Some("spaced"));
    }

    #[test]
    fn test_bearer_token_takes_second_segment_only() {
        // The scheme is not checked, only the position
        assert_eq!(bearer_token(&headers_with("Token xyz")), Some("xyz"));
        assert_eq!(bearer_token(&headers_with("Bearer a b")), Some("a"));
    }

    #[test]
    fn test_bearer_token_missing() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&headers_with("")), None);
    }

    proptest! {
        #[test]
        fn prop_bearer_token_roundtrips(token in "[A-Za-z0-9_\\-\\.]{1,64}") {
            let headers = headers_with(&format!("Bearer {}", token));
            prop_assert_eq!(bearer_token(&headers), Some(token.as_str()));
        }
    }

    #[tokio::test]
    async fn test_extractor_with_valid_header() {
        let app = create_test_app();

        let request = Request::builder()
            .uri("/test")
            .header("authorization", "Bearer user-token")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"user-token");
    }

    #[tokio::test]
    async fn test_extractor_without_header() {
        let app = create_test_app();

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extractor_with_scheme_only() {
        let app = create_test_app();

        let request = Request::builder()
            .uri("/test")
            .header("authorization", "Bearer")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = create_test_app().layer(cors_layer());

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/test")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
