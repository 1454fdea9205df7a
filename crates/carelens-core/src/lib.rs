//! # carelens-core
//!
//! Shared FHIR R4 resource models for the Carelens chart viewer.
//!
//! The models here are deliberately partial: they cover the fields the
//! viewer renders (demographics, medication orders, lab results, vital
//! signs) and tolerate everything else a real server sends back. All
//! wire names follow FHIR's camelCase convention; absent fields default.

pub mod chart;
pub mod error;
pub mod resource;

pub use chart::PatientChart;
pub use error::CoreError;
pub use resource::{
    Bundle, BundleEntry, CodeableConcept, Coding, ContactPoint, HumanName, Identifier,
    MedicationRequest, Observation, ObservationComponent, Patient, Quantity,
};

/// Type alias for core results.
pub type CoreResult<T> = Result<T, CoreError>;
