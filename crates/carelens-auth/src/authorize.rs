//! Authorization request URL construction.

use url::Url;

use crate::config::ProviderConfig;
use crate::pkce::PkceChallenge;

/// Build the provider authorization URL for one sign-in attempt.
///
/// Pure string construction: every parameter value is percent-encoded by
/// the URL serializer, no network traffic happens here.
#[must_use]
pub fn build_authorization_url(config: &ProviderConfig, challenge: &PkceChallenge) -> Url {
    let mut url = config.authorization_endpoint.clone();
    {
        let mut params = url.query_pairs_mut();
        params.append_pair("response_type", "code");
        params.append_pair("client_id", &config.client_id);
        params.append_pair("redirect_uri", config.redirect_uri.as_str());
        params.append_pair("scope", &config.scope);
        params.append_pair("state", challenge.state());
        params.append_pair("code_challenge", challenge.code_challenge());
        params.append_pair("code_challenge_method", "S256");
        params.append_pair("aud", config.fhir_base_url.as_str());
    }
    url
}
