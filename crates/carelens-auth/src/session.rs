//! Sign-in session control.
//!
//! The [`SessionController`] owns the single [`AuthSession`] and is the
//! only component that mutates it. Phases move
//! `Unauthenticated → Authorizing → Authenticated → Unauthenticated`,
//! with `Authorizing → Unauthenticated` on any validation or network
//! failure.
//!
//! One PKCE challenge is live at a time. Starting a new sign-in (or
//! signing out) bumps an internal generation counter, so a stale token
//! exchange result or expiry timer from a superseded attempt can never be
//! applied to a newer session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use carelens_core::PatientChart;

use crate::authorize::build_authorization_url;
use crate::config::ProviderConfig;
use crate::error::AuthError;
use crate::pkce::PkceChallenge;
use crate::token::{TokenBundle, TokenExchanger};

/// Message relayed from the callback server for one authorization
/// redirect.
#[derive(Debug, Clone)]
pub struct AuthCallback {
    pub code: String,
    pub state: String,
}

/// Authentication phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Authorizing,
    Authenticated,
}

/// Snapshot of the session state. Owned by the controller; other
/// components only ever see clones.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub phase: SessionPhase,
    pub last_error: Option<String>,
    pub token: Option<TokenBundle>,
}

impl AuthSession {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            last_error: None,
            token: None,
        }
    }

    /// `true` once a token bundle is held.
    #[must_use]
    pub fn authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    /// `true` while an authorization round-trip is in flight.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.phase == SessionPhase::Authorizing
    }
}

/// Opens the authorization URL in the user's browser.
pub trait BrowserOpener: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::BrowserOpenFailed` when no browser context can
    /// be opened.
    fn open(&self, url: &Url) -> Result<(), AuthError>;
}

/// Error reported by a [`ChartFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server rejected the access token (401-class response).
    #[error("access token rejected")]
    Unauthorized,

    /// Any other fetch failure; does not invalidate the session.
    #[error("{0}")]
    Failed(String),
}

/// Downstream chart fetch, performed when the session becomes
/// authenticated. Implemented by the FHIR client crate.
#[async_trait]
pub trait ChartFetcher: Send + Sync {
    async fn fetch_chart(&self, token: &TokenBundle) -> Result<PatientChart, FetchError>;
}

/// Outcome of handling one relayed callback.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// The message did not belong to a live sign-in attempt and was
    /// dropped.
    Ignored,
    /// The exchange succeeded. `chart` is absent when no fetcher is
    /// configured or when the fetch failed non-fatally (see
    /// `fetch_error`).
    Completed {
        chart: Option<PatientChart>,
        fetch_error: Option<String>,
    },
}

struct SessionState {
    session: AuthSession,
    challenge: Option<PkceChallenge>,
    generation: u64,
    expiry: Option<JoinHandle<()>>,
}

impl SessionState {
    /// Return to the initial state, invalidating the live attempt and any
    /// scheduled expiry. The old expiry handle is returned so the caller
    /// can abort it (the expiry task itself must not abort its own
    /// handle).
    fn reset(&mut self) -> Option<JoinHandle<()>> {
        let old = self.expiry.take();
        self.generation += 1;
        self.challenge = None;
        self.session = AuthSession::new();
        old
    }
}

/// Owns the authentication state machine for one app session.
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    config: ProviderConfig,
    exchanger: TokenExchanger,
    opener: Arc<dyn BrowserOpener>,
    fetcher: Option<Arc<dyn ChartFetcher>>,
    http: reqwest::Client,
    probe_relay: bool,
}

impl SessionController {
    /// Create a controller for the given provider.
    #[must_use]
    pub fn new(config: ProviderConfig, opener: Arc<dyn BrowserOpener>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            state: Arc::new(Mutex::new(SessionState {
                session: AuthSession::new(),
                challenge: None,
                generation: 0,
                expiry: None,
            })),
            exchanger: TokenExchanger::new(config.clone()),
            config,
            opener,
            fetcher: None,
            http,
            probe_relay: true,
        }
    }

    /// Attach the downstream chart fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ChartFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Enable or disable the relay health probe performed before
    /// sign-in (tests disable it).
    #[must_use]
    pub fn with_relay_probe(mut self, enabled: bool) -> Self {
        self.probe_relay = enabled;
        self
    }

    /// Current session snapshot.
    pub async fn session(&self) -> AuthSession {
        self.state.lock().await.session.clone()
    }

    /// Start a sign-in attempt: health-check the relay, generate a PKCE
    /// challenge, open the authorization URL in the browser and move to
    /// `Authorizing`. Any previous attempt or session is invalidated
    /// first.
    ///
    /// Returns the authorization URL that was opened.
    ///
    /// # Errors
    ///
    /// - `AuthError::CallbackServerUnavailable` when the relay probe fails
    /// - `AuthError::CryptoUnavailable` when no secure randomness exists
    /// - `AuthError::BrowserOpenFailed` when the browser cannot be opened
    pub async fn sign_in(&self) -> Result<Url, AuthError> {
        if self.probe_relay {
            self.ensure_relay().await?;
        }

        let challenge = PkceChallenge::generate()?;
        let url = build_authorization_url(&self.config, &challenge);

        let mut state = self.state.lock().await;
        if let Some(task) = state.reset() {
            task.abort();
        }
        if let Err(e) = self.opener.open(&url) {
            state.session.last_error = Some(e.to_string());
            return Err(e);
        }
        state.session.phase = SessionPhase::Authorizing;
        state.challenge = Some(challenge);
        tracing::info!("authorization started, waiting for callback");
        Ok(url)
    }

    /// Handle one relayed callback message.
    ///
    /// The message is dropped silently when no attempt is live (stale
    /// messages after sign-out behave the same as before). A state value
    /// that does not match the live challenge is rejected with
    /// `AuthError::StateMismatch` and the attempt stays pending.
    ///
    /// On a match the challenge is consumed (a second message for the
    /// same attempt is stale by definition), the code is exchanged and,
    /// on success, the session becomes `Authenticated`, the expiry timer
    /// is armed and the downstream chart fetch runs.
    pub async fn handle_callback(
        &self,
        callback: AuthCallback,
    ) -> Result<CallbackOutcome, AuthError> {
        let (challenge, generation) = {
            let mut state = self.state.lock().await;
            match state.challenge.as_ref() {
                None => {
                    tracing::debug!("dropping callback with no live sign-in attempt");
                    return Ok(CallbackOutcome::Ignored);
                }
                Some(challenge) if challenge.state() != callback.state => {
                    let err = AuthError::StateMismatch;
                    state.session.last_error = Some(err.to_string());
                    tracing::warn!("rejected callback with mismatched state");
                    return Err(err);
                }
                Some(_) => {}
            }
            (state.challenge.take(), state.generation)
        };
        let Some(challenge) = challenge else {
            return Ok(CallbackOutcome::Ignored);
        };

        let bundle = match self
            .exchanger
            .exchange(&callback.code, challenge.code_verifier())
            .await
        {
            Ok(bundle) => bundle,
            Err(e) => {
                let mut state = self.state.lock().await;
                if state.generation == generation {
                    state.session.phase = SessionPhase::Unauthenticated;
                    state.session.token = None;
                    state.session.last_error = Some(e.to_string());
                }
                return Err(e);
            }
        };

        {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                tracing::debug!("dropping exchange result for a superseded sign-in attempt");
                return Ok(CallbackOutcome::Ignored);
            }
            state.session.phase = SessionPhase::Authenticated;
            state.session.last_error = None;
            state.session.token = Some(bundle.clone());
            self.arm_expiry(&mut state, bundle.expires_in_seconds, generation);
        }
        tracing::info!(
            patient = %bundle.patient_id,
            expires_in = bundle.expires_in_seconds,
            "authenticated"
        );

        let Some(fetcher) = &self.fetcher else {
            return Ok(CallbackOutcome::Completed {
                chart: None,
                fetch_error: None,
            });
        };
        match fetcher.fetch_chart(&bundle).await {
            Ok(chart) => Ok(CallbackOutcome::Completed {
                chart: Some(chart),
                fetch_error: None,
            }),
            Err(FetchError::Unauthorized) => {
                self.sign_out().await;
                let err = AuthError::Unauthorized;
                self.state.lock().await.session.last_error = Some(err.to_string());
                Err(err)
            }
            Err(FetchError::Failed(message)) => {
                let err = AuthError::ResourceFetchFailed(message);
                let rendered = err.to_string();
                let mut state = self.state.lock().await;
                if state.generation == generation {
                    state.session.last_error = Some(rendered.clone());
                }
                Ok(CallbackOutcome::Completed {
                    chart: None,
                    fetch_error: Some(rendered),
                })
            }
        }
    }

    /// Clear the token, cancel the expiry timer, discard any pending
    /// challenge and return to `Unauthenticated`. Valid from any phase.
    pub async fn sign_out(&self) {
        let mut state = self.state.lock().await;
        if let Some(task) = state.reset() {
            task.abort();
        }
        tracing::info!("signed out");
    }

    async fn ensure_relay(&self) -> Result<(), AuthError> {
        let health = self.config.relay_health_url();
        let reachable = match self.http.get(health.clone()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        };
        if reachable {
            Ok(())
        } else {
            let err = AuthError::CallbackServerUnavailable(health.to_string());
            self.state.lock().await.session.last_error = Some(err.to_string());
            Err(err)
        }
    }

    /// Schedule the forced sign-out at token expiry. The task is
    /// generation-checked: if the session moved on before it fires, it
    /// does nothing.
    fn arm_expiry(&self, state: &mut SessionState, expires_in_seconds: u64, generation: u64) {
        if let Some(old) = state.expiry.take() {
            old.abort();
        }
        let shared = Arc::clone(&self.state);
        state.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(expires_in_seconds)).await;
            let mut state = shared.lock().await;
            if state.generation == generation
                && state.session.phase == SessionPhase::Authenticated
            {
                tracing::info!("access token expired, signing out");
                let _ = state.reset();
            }
        }));
    }
}
