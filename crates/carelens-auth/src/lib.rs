//! # carelens-auth
//!
//! SMART on FHIR authorization for the Carelens chart viewer.
//!
//! This crate owns the client side of the OAuth2 Authorization Code +
//! PKCE flow:
//!
//! - [`pkce`] - verifier/challenge/state generation (RFC 7636, S256 only)
//! - [`authorize`] - authorization request URL construction
//! - [`token`] - authorization-code token exchange
//! - [`session`] - the session controller state machine
//! - [`config`] - static provider configuration
//!
//! The callback relay that terminates the provider redirect lives in
//! `carelens-relay`; it feeds [`session::AuthCallback`] messages into the
//! controller.

pub mod authorize;
pub mod config;
pub mod error;
pub mod pkce;
pub mod session;
pub mod token;

pub use authorize::build_authorization_url;
pub use config::ProviderConfig;
pub use error::AuthError;
pub use pkce::PkceChallenge;
pub use session::{
    AuthCallback, AuthSession, BrowserOpener, CallbackOutcome, ChartFetcher, FetchError,
    SessionController, SessionPhase,
};
pub use token::{TokenBundle, TokenExchanger};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
