use axum::{
    extract::{rejection::FormRejection, Path, State},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{self, CredentialCache, Grant};
use crate::config::Config;
use crate::error::ApiError;
use crate::http_client::SpotifyHttpClient;
use crate::middleware::BearerToken;
use crate::models::relay::{Bpm, ClientTokens, TokenRefreshForm, TokenSwapForm};
use crate::models::spotify::AudioFeatures;

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub credential_cache: Arc<CredentialCache>,
    pub http_client: Arc<SpotifyHttpClient>,
    pub config: Arc<Config>,
}

/// Health check routes
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Token swap and refresh routes
pub fn token_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/token", post(token_swap_handler))
        .route("/api/refresh", post(token_refresh_handler))
        .with_state(state)
}

/// Read-only Web API relay routes
pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/song/:id/bpm", get(song_bpm_handler))
        .route("/api/user/playlists", get(user_playlists_handler))
        .route("/api/playlist/:id/songs", get(playlist_songs_handler))
        .with_state(state)
}

/// Non-empty value of an optional form field
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// GET / - Liveness probe
async fn root_handler() -> &'static str {
    "Server is running"
}

/// GET /health - Detailed health check
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION,
        "client_credentials_cached": state.credential_cache.is_cached().await
    }))
}

/// POST /api/token - Exchange an authorization code for user tokens
///
/// The tokens belong to the caller and are never cached here.
async fn token_swap_handler(
    State(state): State<AppState>,
    form: Result<Form<TokenSwapForm>, FormRejection>,
) -> Result<Json<ClientTokens>, ApiError> {
    tracing::info!("Request to /api/token: attempting token swap");

    let code = form
        .ok()
        .and_then(|Form(form)| required(form.code))
        .ok_or_else(|| ApiError::MissingInput("No auth code".to_string()))?;

    let grant = Grant::AuthorizationCode {
        code: &code,
        redirect_uri: &state.config.redirect_uri,
    };
    let token = auth::request_token(&state.http_client, grant, "token swap").await?;

    Ok(Json(ClientTokens::from_swap(token)))
}

/// POST /api/refresh - Refresh a caller-owned access token
async fn token_refresh_handler(
    State(state): State<AppState>,
    form: Result<Form<TokenRefreshForm>, FormRejection>,
) -> Result<Json<ClientTokens>, ApiError> {
    tracing::info!("Request to /api/refresh: attempting token refresh");

    let refresh_token = form
        .ok()
        .and_then(|Form(form)| required(form.refresh_token))
        .ok_or_else(|| ApiError::MissingInput("Missing refresh_token".to_string()))?;

    let grant = Grant::RefreshToken {
        refresh_token: &refresh_token,
    };
    let token = auth::request_token(&state.http_client, grant, "token refresh").await?;

    if token.refresh_token.is_some() {
        tracing::debug!("Spotify rotated the refresh token, forwarding it");
    }

    Ok(Json(ClientTokens::from_refresh(token)))
}

/// GET /api/song/:id/bpm - Track tempo via the server's own token
async fn song_bpm_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Bpm>, ApiError> {
    tracing::info!("Request to /api/song/{}/bpm", id);

    if id.trim().is_empty() {
        return Err(ApiError::MissingInput("Missing song id".to_string()));
    }

    let token = state.credential_cache.acquire().await?;
    let payload = match fetch_resource(
        &state,
        &["audio-features", id.as_str()],
        &token,
        "tempo lookup",
    )
    .await
    {
        Ok(payload) => payload,
        Err(e @ ApiError::UpstreamRejected { status: 401, .. }) => {
            // Revoked before its expiry; the next lookup fetches a new one
            tracing::warn!("Spotify refused the cached client credentials token");
            state.credential_cache.invalidate(&token).await;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let features: AudioFeatures =
        serde_json::from_value(payload).map_err(|e| ApiError::unavailable("tempo lookup", e))?;

    Ok(Json(Bpm {
        bpm: features.tempo,
    }))
}

/// GET /api/user/playlists - Caller's playlists, relayed verbatim
async fn user_playlists_handler(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>, ApiError> {
    tracing::info!("Request to /api/user/playlists");

    let payload =
        fetch_resource(&state, &["me", "playlists"], &token, "playlist listing").await?;
    Ok(Json(payload))
}

/// GET /api/playlist/:id/songs - Tracks of a playlist, relayed verbatim
async fn playlist_songs_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>, ApiError> {
    tracing::info!("Request to /api/playlist/{}/songs", id);

    if id.trim().is_empty() {
        return Err(ApiError::MissingInput("Missing playlist id".to_string()));
    }

    let payload = fetch_resource(
        &state,
        &["playlists", id.as_str(), "tracks"],
        &token,
        "playlist track listing",
    )
    .await?;
    Ok(Json(payload))
}

/// GET a Web API resource and translate non-2xx answers
async fn fetch_resource(
    state: &AppState,
    segments: &[&str],
    token: &str,
    operation: &'static str,
) -> Result<Value, ApiError> {
    let response = state
        .http_client
        .get_resource(segments, token)
        .await
        .map_err(|e| ApiError::unavailable(operation, e))?;

    if !response.status.is_success() {
        return Err(ApiError::resource_rejected(
            response.status.as_u16(),
            response.body,
        ));
    }

    Ok(response.body)
}
