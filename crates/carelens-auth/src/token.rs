//! Authorization-code token exchange.

use std::time::Duration;

use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::error::AuthError;

/// Access token bundle owned by the session controller.
///
/// Created from the provider's token response, held in memory only, and
/// destroyed on sign-out or expiry.
#[derive(Debug, Clone)]
pub struct TokenBundle {
    pub access_token: String,
    pub patient_id: String,
    pub expires_in_seconds: u64,
    pub token_type: String,
}

/// Wire shape of the provider token response. Every field is required;
/// a response missing any of them is malformed.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    patient: String,
    expires_in: u64,
    token_type: String,
}

/// Exchanges an authorization code (plus its PKCE verifier) for a token
/// bundle.
pub struct TokenExchanger {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl TokenExchanger {
    /// Create an exchanger for the given provider.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { http, config }
    }

    /// Exchange an authorization code for a token bundle.
    ///
    /// Issues a single form-encoded `POST`. Authorization codes are
    /// single-use, so a failed exchange is never retried; the error
    /// surfaces immediately.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenExchangeFailed` on any non-success HTTP status
    /// - `AuthError::MalformedTokenResponse` if required fields are absent
    /// - `AuthError::Network` on transport failures
    pub async fn exchange(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenBundle, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        tracing::debug!(
            endpoint = %self.config.token_endpoint,
            "exchanging authorization code"
        );

        let response = self
            .http
            .post(self.config.token_endpoint.as_str())
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AuthError::token_exchange_failed(status.as_u16(), body));
        }

        let parsed: TokenEndpointResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::MalformedTokenResponse(e.to_string()))?;

        Ok(TokenBundle {
            access_token: parsed.access_token,
            patient_id: parsed.patient,
            expires_in_seconds: parsed.expires_in,
            token_type: parsed.token_type,
        })
    }
}
