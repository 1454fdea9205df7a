//! Error types for the authorization flow.
//!
//! Everything here is recovered at the session-controller boundary and
//! surfaced as a user-visible message; none of these abort the process.

use thiserror::Error;

/// Errors that can occur during sign-in, token exchange or session
/// management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The OS secure random source could not be read.
    #[error("Secure randomness unavailable: {0}")]
    CryptoUnavailable(String),

    /// The local callback relay did not answer its health check.
    #[error("Callback server is not reachable at {0}")]
    CallbackServerUnavailable(String),

    /// The system browser could not be opened for the authorization
    /// redirect.
    #[error("Could not open browser for sign-in: {0}")]
    BrowserOpenFailed(String),

    /// A relayed callback carried a state value that does not match the
    /// live sign-in attempt.
    #[error("Callback state does not match the pending sign-in attempt")]
    StateMismatch,

    /// The token endpoint answered with a non-success status.
    /// Authorization codes are single-use, so this is never retried.
    #[error("Token exchange failed: HTTP {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    /// The token endpoint answered 2xx but the body is missing required
    /// fields.
    #[error("Malformed token response: {0}")]
    MalformedTokenResponse(String),

    /// The downstream chart fetch failed for a reason other than an
    /// expired/rejected token.
    #[error("Resource fetch failed: {0}")]
    ResourceFetchFailed(String),

    /// The FHIR server rejected the access token; a fresh sign-in is
    /// required.
    #[error("Access token rejected by the FHIR server; sign in again")]
    Unauthorized,

    /// Transport-level error talking to the provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AuthError {
    /// Create a `TokenExchangeFailed` error.
    #[must_use]
    pub fn token_exchange_failed(status: u16, body: impl Into<String>) -> Self {
        Self::TokenExchangeFailed {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` if the error means the user has to start a new
    /// sign-in attempt (as opposed to retrying a fetch).
    #[must_use]
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Self::TokenExchangeFailed { .. } | Self::MalformedTokenResponse(_) | Self::Unauthorized
        )
    }

    /// Returns `true` if the error comes from local environment setup
    /// rather than the provider.
    #[must_use]
    pub fn is_environment_error(&self) -> bool {
        matches!(
            self,
            Self::CryptoUnavailable(_)
                | Self::CallbackServerUnavailable(_)
                | Self::BrowserOpenFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AuthError::token_exchange_failed(400, "invalid_grant");
        assert_eq!(
            err.to_string(),
            "Token exchange failed: HTTP 400: invalid_grant"
        );

        let err = AuthError::CallbackServerUnavailable("http://localhost:3000".to_string());
        assert!(err.to_string().contains("http://localhost:3000"));
    }

    #[test]
    fn error_predicates() {
        assert!(AuthError::token_exchange_failed(400, "x").requires_sign_in());
        assert!(AuthError::Unauthorized.requires_sign_in());
        assert!(!AuthError::StateMismatch.requires_sign_in());

        assert!(AuthError::CryptoUnavailable("no entropy".to_string()).is_environment_error());
        assert!(AuthError::BrowserOpenFailed("no display".to_string()).is_environment_error());
        assert!(!AuthError::StateMismatch.is_environment_error());
    }
}
