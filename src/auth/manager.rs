use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::grants;
use super::types::{CachedCredential, Grant};
use crate::error::{ApiError, Result};
use crate::http_client::SpotifyHttpClient;

const OPERATION: &str = "client credentials fetch";

/// Server-level token cache for backend-only Web API calls
///
/// Holds at most one client-credentials token. Reads of a valid token only
/// take the shared read lock; refreshes are serialized so that concurrent
/// callers hitting an expired token share a single upstream fetch.
pub struct CredentialCache {
    /// Current credential, if any
    credential: RwLock<Option<CachedCredential>>,

    /// Held for the duration of a refresh
    refresh_lock: Mutex<()>,

    /// HTTP client for token requests
    client: Arc<SpotifyHttpClient>,

    /// Tokens closer than this to expiry are treated as expired
    refresh_threshold: Duration,
}

impl CredentialCache {
    /// Create an empty cache
    pub fn new(client: Arc<SpotifyHttpClient>, refresh_threshold: u64) -> Self {
        Self {
            credential: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            client,
            refresh_threshold: Duration::seconds(refresh_threshold as i64),
        }
    }

    /// Token from the cache if it is still valid
    async fn cached_token(&self) -> Option<String> {
        let credential = self.credential.read().await;
        credential
            .as_ref()
            .filter(|c| c.is_valid_at(Utc::now(), self.refresh_threshold))
            .map(|c| c.token.clone())
    }

    /// Get a valid access token, fetching a new one if necessary
    ///
    /// The cache is left untouched when the fetch fails.
    pub async fn acquire(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await {
            tracing::debug!("Using cached client credentials token");
            return Ok(token);
        }

        let _refresh = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we were queued
        if let Some(token) = self.cached_token().await {
            tracing::debug!("Using client credentials token refreshed by a concurrent request");
            return Ok(token);
        }

        tracing::info!("No valid client credentials token, requesting a new one");

        let credential = self.fetch().await?;
        let token = credential.token.clone();

        tracing::info!(
            "Client credentials token refreshed, expires: {}",
            credential.expires_at.to_rfc3339()
        );

        *self.credential.write().await = Some(credential);

        Ok(token)
    }

    async fn fetch(&self) -> Result<CachedCredential> {
        let response = grants::request_token(&self.client, Grant::ClientCredentials, OPERATION)
            .await
            .map_err(|e| match e {
                // A rejected client credentials grant means the server's own
                // configuration is wrong, not the caller's request
                ApiError::UpstreamRejected { status, body } => ApiError::unavailable(
                    OPERATION,
                    anyhow::anyhow!("client credentials grant rejected ({}): {}", status, body),
                ),
                other => other,
            })?;

        Ok(CachedCredential::from_response(&response, Utc::now()))
    }

    /// Whether a valid token is currently cached
    pub async fn is_cached(&self) -> bool {
        self.cached_token().await.is_some()
    }

    /// Drop `token` so the next `acquire` fetches a new one
    ///
    /// Does nothing when the cache already holds a different token, so a late
    /// rejection of a replaced token cannot evict its successor.
    pub async fn invalidate(&self, token: &str) {
        let mut credential = self.credential.write().await;
        if credential.as_ref().is_some_and(|c| c.token == token) {
            *credential = None;
            tracing::debug!("Client credentials token invalidated");
        } else {
            tracing::debug!("Rejected token already replaced, keeping cache");
        }
    }

    /// Replace the cached credential
    #[cfg(test)]
    pub(crate) async fn seed(&self, credential: CachedCredential) {
        *self.credential.write().await = Some(credential);
    }
}
