//! PKCE (Proof Key for Code Exchange) challenge generation.
//!
//! Implements the client side of RFC 7636 with the S256 method only.
//! One challenge is generated per sign-in attempt, lives in memory for the
//! duration of the authorization round-trip, and is discarded afterwards.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Unreserved characters from RFC 3986 section 2.3, the only characters
/// allowed in a code verifier.
const UNRESERVED: &[u8; 66] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Code verifier length. RFC 7636 allows 43-128; we always use the
/// maximum.
pub const VERIFIER_LEN: usize = 128;

/// Length of the anti-forgery state token.
pub const STATE_LEN: usize = 32;

/// A PKCE challenge for one sign-in attempt: the secret verifier, its
/// S256 challenge, and the anti-forgery state token sent alongside it.
///
/// Invariant: `code_challenge == BASE64URL(SHA256(code_verifier))`,
/// unpadded.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    code_verifier: String,
    code_challenge: String,
    state: String,
}

impl PkceChallenge {
    /// Generate a fresh challenge from the OS secure random source.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CryptoUnavailable` if the OS random source
    /// cannot be read.
    pub fn generate() -> Result<Self, AuthError> {
        let code_verifier = random_unreserved(VERIFIER_LEN)?;
        let code_challenge = compute_challenge(&code_verifier);
        let state = random_unreserved(STATE_LEN)?;
        Ok(Self {
            code_verifier,
            code_challenge,
            state,
        })
    }

    /// The secret verifier, sent only to the token endpoint.
    #[must_use]
    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }

    /// The S256 challenge, sent in the authorization request.
    #[must_use]
    pub fn code_challenge(&self) -> &str {
        &self.code_challenge
    }

    /// The anti-forgery state token.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }
}

/// `BASE64URL(SHA256(ASCII(code_verifier)))` without padding, per
/// RFC 7636 section 4.2.
#[must_use]
pub fn compute_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Draw `len` characters uniformly from the unreserved set.
///
/// Rejection sampling keeps the distribution uniform: a byte is accepted
/// only below 198 (= 3 * 66), then reduced mod 66.
fn random_unreserved(len: usize) -> Result<String, AuthError> {
    const LIMIT: u8 = 198;

    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 256];
    while out.len() < len {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| AuthError::CryptoUnavailable(e.to_string()))?;
        for &byte in &buf {
            if out.len() == len {
                break;
            }
            if byte < LIMIT {
                out.push(UNRESERVED[(byte % 66) as usize] as char);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_unreserved(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
    }

    #[test]
    fn generated_lengths_and_charset() {
        let challenge = PkceChallenge::generate().unwrap();
        assert_eq!(challenge.code_verifier().len(), VERIFIER_LEN);
        assert_eq!(challenge.state().len(), STATE_LEN);
        assert!(challenge.code_verifier().chars().all(is_unreserved));
        assert!(challenge.state().chars().all(is_unreserved));
    }

    #[test]
    fn challenge_matches_verifier_hash() {
        let challenge = PkceChallenge::generate().unwrap();
        assert_eq!(
            challenge.code_challenge(),
            compute_challenge(challenge.code_verifier())
        );
        // SHA-256 is 32 bytes, 43 characters in unpadded base64url
        assert_eq!(challenge.code_challenge().len(), 43);
        assert!(!challenge.code_challenge().contains('='));
    }

    #[test]
    fn rfc7636_appendix_b_test_vector() {
        assert_eq!(
            compute_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn state_values_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let challenge = PkceChallenge::generate().unwrap();
            assert!(
                seen.insert(challenge.state().to_string()),
                "state collision after {} generations",
                seen.len()
            );
        }
    }

    #[test]
    fn successive_verifiers_differ() {
        let a = PkceChallenge::generate().unwrap();
        let b = PkceChallenge::generate().unwrap();
        assert_ne!(a.code_verifier(), b.code_verifier());
        assert_ne!(a.state(), b.state());
    }
}
