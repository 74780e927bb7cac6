use serde::{Deserialize, Serialize};

use super::spotify::TokenResponse;

// ==================================================================================================
// Inbound forms
// ==================================================================================================

/// POST /api/token form body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenSwapForm {
    #[serde(default)]
    pub code: Option<String>,
}

/// POST /api/refresh form body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRefreshForm {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// ==================================================================================================
// Outbound bodies
// ==================================================================================================

/// Tokens handed back to the client application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientTokens {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl ClientTokens {
    /// Tokens from an authorization code exchange
    pub fn from_swap(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
        }
    }

    /// Tokens from a refresh grant
    ///
    /// Spotify normally keeps the caller's refresh token valid, but when it
    /// rotates one the replacement has to reach the client or the old one
    /// stops working.
    pub fn from_refresh(response: TokenResponse) -> Self {
        Self::from_swap(response)
    }
}

/// GET /api/song/:id/bpm response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bpm {
    pub bpm: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_response(refresh_token: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "access".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_in: 3600,
            token_type: Some("Bearer".to_string()),
            scope: None,
        }
    }

    #[test]
    fn test_swap_serializes_all_fields() {
        let tokens = ClientTokens::from_swap(token_response(Some("refresh")));
        assert_eq!(
            serde_json::to_value(&tokens).unwrap(),
            json!({
                "access_token": "access",
                "refresh_token": "refresh",
                "expires_in": 3600
            })
        );
    }

    #[test]
    fn test_refresh_without_rotation_omits_refresh_token() {
        let tokens = ClientTokens::from_refresh(token_response(None));
        assert_eq!(
            serde_json::to_value(&tokens).unwrap(),
            json!({ "access_token": "access", "expires_in": 3600 })
        );
    }

    #[test]
    fn test_refresh_with_rotation_forwards_new_token() {
        let tokens = ClientTokens::from_refresh(token_response(Some("rotated")));
        assert_eq!(tokens.refresh_token.as_deref(), Some("rotated"));
    }

    #[test]
    fn test_forms_tolerate_missing_fields() {
        let form: TokenSwapForm = serde_json::from_value(json!({})).unwrap();
        assert!(form.code.is_none());

        let form: TokenRefreshForm = serde_json::from_value(json!({ "other": "x" })).unwrap();
        assert!(form.refresh_token.is_none());
    }
}
