use url::Url;

use carelens_auth::{AuthError, BrowserOpener};

/// Opens URLs with the platform's default browser.
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &Url) -> Result<(), AuthError> {
        open::that(url.as_str()).map_err(|e| AuthError::BrowserOpenFailed(e.to_string()))
    }
}
