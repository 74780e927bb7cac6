// Token endpoint calls

use serde_json::Value;

use super::types::Grant;
use crate::error::{ApiError, Result};
use crate::http_client::SpotifyHttpClient;
use crate::models::spotify::TokenResponse;

/// Run a grant against the accounts token endpoint
///
/// An `error` field in the body wins over the HTTP status and becomes
/// `UpstreamRejected`. Anything else that is not a usable token response is
/// reported as `UpstreamUnavailable` for `operation`.
pub async fn request_token(
    client: &SpotifyHttpClient,
    grant: Grant<'_>,
    operation: &'static str,
) -> Result<TokenResponse> {
    tracing::debug!(grant_type = grant.grant_type(), "Requesting token");

    let response = client
        .post_token_form(&grant.form())
        .await
        .map_err(|e| ApiError::unavailable(operation, e))?;

    if let Some(error) = response.body.get("error") {
        let code = match error {
            Value::String(code) => code.clone(),
            other => other.to_string(),
        };
        let description = response
            .body
            .get("error_description")
            .and_then(Value::as_str);

        tracing::warn!(
            grant_type = grant.grant_type(),
            error = %code,
            description = description.unwrap_or(""),
            "Token endpoint rejected grant"
        );
        return Err(ApiError::token_rejected(&code, description));
    }

    if !response.status.is_success() {
        return Err(ApiError::unavailable(
            operation,
            anyhow::anyhow!(
                "token endpoint returned {} without an error field: {}",
                response.status,
                response.body
            ),
        ));
    }

    let token: TokenResponse = serde_json::from_value(response.body)
        .map_err(|e| ApiError::unavailable(operation, e))?;

    if token.access_token.is_empty() {
        return Err(ApiError::unavailable(
            operation,
            anyhow::anyhow!("token response does not contain access_token"),
        ));
    }

    tracing::info!(
        grant_type = grant.grant_type(),
        expires_in = token.expires_in,
        "Token issued"
    );

    Ok(token)
}
