//! Static SMART on FHIR provider configuration.
//!
//! The provider endpoints, client id, redirect URI and scope are fixed at
//! build time; only the local FHIR server used by the unauthenticated CRUD
//! screen is runtime-configurable (and lives in the CLI, not here).

use url::Url;

/// Configuration for one SMART on FHIR authorization provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// OAuth2 authorization endpoint.
    pub authorization_endpoint: Url,
    /// OAuth2 token endpoint.
    pub token_endpoint: Url,
    /// Public client identifier registered with the provider.
    pub client_id: String,
    /// Redirect URI served by the local callback relay.
    pub redirect_uri: Url,
    /// Requested scopes, space-separated.
    pub scope: String,
    /// FHIR base URL, sent as the `aud` parameter and used for chart
    /// fetches.
    pub fhir_base_url: Url,
}

impl ProviderConfig {
    /// The EPIC sandbox registration used by this app.
    #[must_use]
    pub fn epic_sandbox() -> Self {
        Self {
            authorization_endpoint: Url::parse(
                "https://fhir.epic.com/interconnect-fhir-oauth/oauth2/authorize",
            )
            .expect("static authorize endpoint"),
            token_endpoint: Url::parse(
                "https://fhir.epic.com/interconnect-fhir-oauth/oauth2/token",
            )
            .expect("static token endpoint"),
            client_id: "408fb977-96fc-4227-b22e-f78b35613570".to_string(),
            redirect_uri: Url::parse("http://localhost:3000").expect("static redirect URI"),
            scope: "openid fhirUser".to_string(),
            fhir_base_url: Url::parse(
                "https://fhir.epic.com/interconnect-fhir-oauth/api/FHIR/R4/",
            )
            .expect("static FHIR base URL"),
        }
    }

    /// Override the token endpoint (used to point at a mock server).
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
        self.token_endpoint = endpoint;
        self
    }

    /// Override the redirect URI (used when the relay runs on a
    /// non-default port).
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
        self.redirect_uri = redirect_uri;
        self
    }

    /// Health-check URL of the callback relay implied by the redirect
    /// URI.
    #[must_use]
    pub fn relay_health_url(&self) -> Url {
        let mut url = self.redirect_uri.clone();
        url.set_path("/health");
        url.set_query(None);
        url
    }
}
