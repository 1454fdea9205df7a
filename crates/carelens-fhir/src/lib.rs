//! # carelens-fhir
//!
//! FHIR REST clients for the Carelens viewer:
//!
//! - [`client`] - unauthenticated Patient CRUD against a user-supplied
//!   local FHIR server (URL validated for scheme only)
//! - [`smart`] - bearer-authenticated chart fetches against the
//!   authorization provider's FHIR endpoint

pub mod client;
pub mod error;
pub mod smart;

pub use client::{FhirClient, PatientInput};
pub use error::FhirError;
pub use smart::{SmartChartFetcher, SmartClient};

/// Type alias for FHIR client results.
pub type FhirResult<T> = Result<T, FhirError>;
