// Authentication types

use chrono::{DateTime, Duration, Utc};

use crate::models::spotify::TokenResponse;

/// OAuth2 grant sent to the accounts token endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grant<'a> {
    /// Server-to-server token, no end user involved
    ClientCredentials,

    /// One-time code from an interactive login
    AuthorizationCode { code: &'a str, redirect_uri: &'a str },

    /// Caller-owned refresh token
    RefreshToken { refresh_token: &'a str },
}

impl<'a> Grant<'a> {
    /// Wire value of `grant_type`
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::ClientCredentials => "client_credentials",
            Grant::AuthorizationCode { .. } => "authorization_code",
            Grant::RefreshToken { .. } => "refresh_token",
        }
    }

    /// Form body for the token request
    pub fn form(&self) -> Vec<(&'a str, &'a str)> {
        let mut form = vec![("grant_type", self.grant_type())];
        match *self {
            Grant::ClientCredentials => {}
            Grant::AuthorizationCode { code, redirect_uri } => {
                form.push(("code", code));
                form.push(("redirect_uri", redirect_uri));
            }
            Grant::RefreshToken { refresh_token } => {
                form.push(("refresh_token", refresh_token));
            }
        }
        form
    }
}

/// First characters of a token, safe to log
pub fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

/// Longest token lifetime taken at face value; larger `expires_in` values are clamped
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Server-level access token with its absolute expiry
#[derive(Debug, Clone)]
pub struct CachedCredential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedCredential {
    /// Build from a token response received at `now`
    pub fn from_response(response: &TokenResponse, now: DateTime<Utc>) -> Self {
        if response.expires_in > MAX_TOKEN_LIFETIME_SECS {
            tracing::warn!(
                expires_in = response.expires_in,
                "Token lifetime out of range, clamping to {}s",
                MAX_TOKEN_LIFETIME_SECS
            );
        }
        let lifetime = Duration::seconds(response.expires_in.min(MAX_TOKEN_LIFETIME_SECS) as i64);

        Self {
            token: response.access_token.clone(),
            issued_at: now,
            expires_at: now
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Margin before expiry at which the token counts as stale
    ///
    /// Never more than half the token's lifetime, so short-lived tokens are
    /// still reused for a while instead of being refetched on every call.
    pub fn refresh_margin(&self, threshold: Duration) -> Duration {
        let half_life = (self.expires_at - self.issued_at) / 2;
        threshold.min(half_life).max(Duration::zero())
    }

    /// Usable at `now` when it outlives `now` by more than the refresh margin
    pub fn is_valid_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now + self.refresh_margin(threshold) < self.expires_at
    }
}
