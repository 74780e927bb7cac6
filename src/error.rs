// Error handling module
// Defines the relay error taxonomy and its HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors surfaced by relay handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller omitted a required field
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// No bearer token supplied
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Spotify answered with a structured error
    #[error("Upstream rejected request: {status} - {body}")]
    UpstreamRejected { status: u16, body: Value },

    /// Transport, timeout or parse failure while talking to Spotify
    #[error("Upstream unavailable during {operation}: {source}")]
    UpstreamUnavailable {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    /// Error returned by the accounts token endpoint (`{error, error_description}`)
    pub fn token_rejected(error: &str, description: Option<&str>) -> Self {
        ApiError::UpstreamRejected {
            status: StatusCode::BAD_REQUEST.as_u16(),
            body: json!({
                "error": error,
                "description": description,
            }),
        }
    }

    /// Error returned by a Web API resource endpoint (`{error: {status, message}}`)
    ///
    /// Bodies that are not shaped like a Spotify error are relayed as the
    /// `error` value unchanged.
    pub fn resource_rejected(status: u16, upstream: Value) -> Self {
        let error = match upstream {
            Value::Object(mut map) if map.contains_key("error") => {
                map.remove("error").unwrap_or(Value::Null)
            }
            other => other,
        };
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        ApiError::UpstreamRejected {
            status,
            body: json!({
                "error": error,
                "message": message,
            }),
        }
    }

    pub fn unavailable(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        ApiError::UpstreamUnavailable {
            operation,
            source: source.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            ApiError::UpstreamRejected { status, body } => {
                let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                tracing::warn!(status = status, body = %body, "Spotify rejected request");
                (status_code, body)
            }
            ApiError::UpstreamUnavailable { operation, source } => {
                // Details stay in the log, the caller only sees the operation
                tracing::error!("Upstream failure during {}: {:#}", operation, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": format!("Server error during {}", operation) }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, ApiError>;
