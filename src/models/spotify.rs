use serde::Deserialize;

// ==================================================================================================
// Accounts service (/api/token)
// ==================================================================================================

/// Successful response from the accounts token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Spotify access tokens live for an hour unless told otherwise
fn default_expires_in() -> u64 {
    3600
}

// ==================================================================================================
// Web API
// ==================================================================================================

/// The slice of `/audio-features/{id}` the relay reads
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeatures {
    pub tempo: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_response_full() {
        let response: TokenResponse = serde_json::from_value(json!({
            "access_token": "BQD",
            "refresh_token": "AQB",
            "expires_in": 3600,
            "token_type": "Bearer",
            "scope": "playlist-read-private"
        }))
        .unwrap();

        assert_eq!(response.access_token, "BQD");
        assert_eq!(response.refresh_token.as_deref(), Some("AQB"));
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.token_type.as_deref(), Some("Bearer"));
    }

    #[test]
    fn test_token_response_client_credentials_shape() {
        // Client credentials grants carry neither refresh token nor scope
        let response: TokenResponse = serde_json::from_value(json!({
            "access_token": "BQC",
            "token_type": "Bearer",
            "expires_in": 120
        }))
        .unwrap();

        assert!(response.refresh_token.is_none());
        assert!(response.scope.is_none());
        assert_eq!(response.expires_in, 120);
    }

    #[test]
    fn test_token_response_default_expiry() {
        let response: TokenResponse =
            serde_json::from_value(json!({ "access_token": "BQC" })).unwrap();
        assert_eq!(response.expires_in, 3600);
    }

    #[test]
    fn test_token_response_requires_access_token() {
        let result = serde_json::from_value::<TokenResponse>(json!({ "expires_in": 3600 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_audio_features_ignores_other_fields() {
        let features: AudioFeatures = serde_json::from_value(json!({
            "danceability": 0.7,
            "energy": 0.8,
            "tempo": 128.0,
            "id": "11dFghVXANMlKmJXsNCbNl"
        }))
        .unwrap();
        assert_eq!(features.tempo, 128.0);
    }
}
