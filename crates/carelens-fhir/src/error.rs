use thiserror::Error;

use carelens_core::CoreError;

/// Errors from FHIR REST calls.
#[derive(Debug, Error)]
pub enum FhirError {
    /// The configured base URL is not an http/https URL.
    #[error("Invalid FHIR base URL \"{0}\": must be a valid HTTP or HTTPS URL")]
    InvalidBaseUrl(String),

    /// The server answered with a non-success status other than 401/403.
    #[error("Request failed: HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The server rejected the credentials (401/403). During a chart
    /// fetch this forces re-authentication.
    #[error("Not authorized (HTTP {0})")]
    Unauthorized(u16),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The payload did not decode as the expected resource shape.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl FhirError {
    /// Returns `true` if the error means the access token is no longer
    /// usable.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
