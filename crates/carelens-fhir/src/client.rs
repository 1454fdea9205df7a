//! Unauthenticated Patient CRUD against a local FHIR server.
//!
//! The base URL is user-supplied free text and is validated for scheme
//! only; everything else is the server's problem.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use carelens_core::{Bundle, CoreError, HumanName, Patient};

use crate::error::FhirError;

/// Form data for creating or updating a patient.
#[derive(Debug, Clone)]
pub struct PatientInput {
    pub name: String,
    pub gender: String,
    pub birth_date: String,
    pub phone: Option<String>,
}

impl PatientInput {
    /// Build the FHIR Patient resource for this form. The last
    /// whitespace-separated word becomes the family name; everything
    /// before it the given names.
    #[must_use]
    pub fn to_resource(&self, id: Option<&str>) -> Patient {
        let mut words: Vec<String> = self.name.split_whitespace().map(String::from).collect();
        let family = if words.len() > 1 { words.pop() } else { None };

        let mut patient = Patient {
            id: id.map(String::from),
            gender: Some(self.gender.clone()),
            birth_date: Some(self.birth_date.clone()),
            ..Patient::default()
        };
        patient.name = vec![HumanName {
            given: words,
            family,
        }];
        if let Some(phone) = &self.phone
            && !phone.is_empty()
        {
            patient.telecom = vec![carelens_core::ContactPoint {
                system: Some("phone".to_string()),
                value: Some(phone.clone()),
            }];
        }
        patient
    }
}

/// Client for the unauthenticated Patient CRUD screen.
pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
}

impl FhirClient {
    /// Create a client for the given base URL (e.g.
    /// `http://localhost:8080/fhir`).
    ///
    /// # Errors
    ///
    /// Returns `FhirError::InvalidBaseUrl` unless the URL parses with an
    /// http or https scheme.
    pub fn new(base_url: &str) -> Result<Self, FhirError> {
        let trimmed = base_url.trim();
        let parsed =
            Url::parse(trimmed).map_err(|_| FhirError::InvalidBaseUrl(trimmed.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FhirError::InvalidBaseUrl(trimmed.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Ok(Self {
            http,
            base_url: trimmed.trim_end_matches('/').to_string(),
        })
    }

    fn fhir_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Accept", "application/fhir+json")
    }

    /// Fetch all patients.
    pub async fn list_patients(&self) -> Result<Vec<Patient>, FhirError> {
        let url = self.fhir_url("Patient");
        tracing::debug!(%url, "fetching patient list");
        let resp = self.request(reqwest::Method::GET, &url).send().await?;
        let body = check_response(resp).await?;
        let bundle: Bundle = serde_json::from_str(&body).map_err(CoreError::from)?;
        Ok(bundle.resources()?)
    }

    /// Read one patient by id.
    pub async fn read_patient(&self, id: &str) -> Result<Patient, FhirError> {
        let url = self.fhir_url(&format!("Patient/{id}"));
        let resp = self.request(reqwest::Method::GET, &url).send().await?;
        let body = check_response(resp).await?;
        Ok(serde_json::from_str(&body).map_err(CoreError::from)?)
    }

    /// Create a patient from form input.
    pub async fn create_patient(&self, input: &PatientInput) -> Result<(), FhirError> {
        let url = self.fhir_url("Patient");
        let resource = input.to_resource(None);
        let resp = self
            .request(reqwest::Method::POST, &url)
            .header("Content-Type", "application/fhir+json")
            .json(&resource)
            .send()
            .await?;
        check_response(resp).await?;
        Ok(())
    }

    /// Update an existing patient from form input.
    pub async fn update_patient(&self, id: &str, input: &PatientInput) -> Result<(), FhirError> {
        let url = self.fhir_url(&format!("Patient/{id}"));
        let resource = input.to_resource(Some(id));
        let resp = self
            .request(reqwest::Method::PUT, &url)
            .header("Content-Type", "application/fhir+json")
            .json(&resource)
            .send()
            .await?;
        check_response(resp).await?;
        Ok(())
    }

    /// Delete a patient.
    pub async fn delete_patient(&self, id: &str) -> Result<(), FhirError> {
        let url = self.fhir_url(&format!("Patient/{id}"));
        let resp = self.request(reqwest::Method::DELETE, &url).send().await?;
        check_response(resp).await?;
        Ok(())
    }
}

/// Map a response to its body, or the appropriate error. When the body
/// is an OperationOutcome its diagnostics become the error message.
pub(crate) async fn check_response(resp: reqwest::Response) -> Result<String, FhirError> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if status.is_success() {
        return Ok(body);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FhirError::Unauthorized(status.as_u16()));
    }

    if let Ok(json) = serde_json::from_str::<Value>(&body)
        && json.get("resourceType").and_then(|v| v.as_str()) == Some("OperationOutcome")
        && let Some(issues) = json.get("issue").and_then(|v| v.as_array())
    {
        let msgs: Vec<&str> = issues
            .iter()
            .filter_map(|i| i.get("diagnostics").and_then(|d| d.as_str()))
            .collect();
        if !msgs.is_empty() {
            return Err(FhirError::RequestFailed {
                status: status.as_u16(),
                body: msgs.join("; "),
            });
        }
    }

    Err(FhirError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}
