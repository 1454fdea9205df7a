//! Bearer-authenticated chart fetches against the provider's FHIR
//! endpoint.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use carelens_auth::{ChartFetcher, FetchError, TokenBundle};
use carelens_core::{Bundle, CoreError, MedicationRequest, Observation, Patient, PatientChart};

use crate::client::check_response;
use crate::error::FhirError;

/// Authenticated client for one access token.
pub struct SmartClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
}

impl SmartClient {
    /// Create a client against the provider FHIR base URL (must end with
    /// a slash so resource paths join underneath it).
    #[must_use]
    pub fn new(base_url: Url, access_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            base_url,
            access_token: access_token.into(),
        }
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/fhir+json")
    }

    fn resource_url(&self, path: &str) -> Result<Url, FhirError> {
        self.base_url
            .join(path)
            .map_err(|_| FhirError::InvalidBaseUrl(format!("{}{path}", self.base_url)))
    }

    /// Read the patient the token was issued for.
    pub async fn read_patient(&self, patient_id: &str) -> Result<Patient, FhirError> {
        let url = self.resource_url(&format!("Patient/{patient_id}"))?;
        tracing::debug!(%url, "fetching patient");
        let resp = self.request(url).send().await?;
        let body = check_response(resp).await?;
        Ok(serde_json::from_str(&body).map_err(CoreError::from)?)
    }

    async fn search(
        &self,
        resource_type: &str,
        params: &[(&str, &str)],
    ) -> Result<Bundle, FhirError> {
        let url = self.resource_url(resource_type)?;
        let resp = self.request(url).query(params).send().await?;
        let body = check_response(resp).await?;
        Ok(serde_json::from_str(&body).map_err(CoreError::from)?)
    }

    /// Medication orders, newest first.
    pub async fn medications(&self, patient_id: &str) -> Result<Vec<MedicationRequest>, FhirError> {
        let bundle = self
            .search(
                "MedicationRequest",
                &[("patient", patient_id), ("_sort", "-authored")],
            )
            .await?;
        Ok(bundle.resources()?)
    }

    /// Laboratory results, newest first.
    pub async fn lab_results(&self, patient_id: &str) -> Result<Vec<Observation>, FhirError> {
        let bundle = self
            .search(
                "Observation",
                &[
                    ("patient", patient_id),
                    ("category", "laboratory"),
                    ("_sort", "-date"),
                ],
            )
            .await?;
        Ok(bundle.resources()?)
    }

    /// Vital-sign readings, newest first.
    pub async fn vital_signs(&self, patient_id: &str) -> Result<Vec<Observation>, FhirError> {
        let bundle = self
            .search(
                "Observation",
                &[
                    ("patient", patient_id),
                    ("category", "vital-signs"),
                    ("_sort", "-date"),
                ],
            )
            .await?;
        Ok(bundle.resources()?)
    }

    /// Fetch the full chart for a patient.
    pub async fn fetch_chart(&self, patient_id: &str) -> Result<PatientChart, FhirError> {
        let patient = self.read_patient(patient_id).await?;
        let medications = self.medications(patient_id).await?;
        let lab_results = self.lab_results(patient_id).await?;
        let vital_signs = self.vital_signs(patient_id).await?;
        tracing::info!(
            medications = medications.len(),
            lab_results = lab_results.len(),
            vital_signs = vital_signs.len(),
            "chart fetched"
        );
        Ok(PatientChart {
            patient,
            medications,
            lab_results,
            vital_signs,
        })
    }
}

/// [`ChartFetcher`] implementation handed to the session controller: it
/// builds a short-lived [`SmartClient`] per token and maps 401-class
/// failures so the controller can force re-authentication.
pub struct SmartChartFetcher {
    fhir_base_url: Url,
}

impl SmartChartFetcher {
    #[must_use]
    pub fn new(fhir_base_url: Url) -> Self {
        Self { fhir_base_url }
    }
}

#[async_trait]
impl ChartFetcher for SmartChartFetcher {
    async fn fetch_chart(&self, token: &TokenBundle) -> Result<PatientChart, FetchError> {
        let client = SmartClient::new(self.fhir_base_url.clone(), &token.access_token);
        client
            .fetch_chart(&token.patient_id)
            .await
            .map_err(|e| match e {
                FhirError::Unauthorized(_) => FetchError::Unauthorized,
                other => FetchError::Failed(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/api/FHIR/R4/", server.uri())).unwrap()
    }

    async fn mount_chart_mocks(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/FHIR/R4/Patient/p1"))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Patient",
                "id": "p1",
                "name": [{"given": ["Camila"], "family": "Lopez"}]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/FHIR/R4/MedicationRequest"))
            .and(query_param("patient", "p1"))
            .and(query_param("_sort", "-authored"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": [{"resource": {
                    "resourceType": "MedicationRequest",
                    "id": "m1",
                    "medicationCodeableConcept": {"text": "lisinopril 10 MG"},
                    "status": "active"
                }}]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/FHIR/R4/Observation"))
            .and(query_param("patient", "p1"))
            .and(query_param("category", "laboratory"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": [{"resource": {
                    "resourceType": "Observation",
                    "id": "o1",
                    "code": {"text": "Hemoglobin"},
                    "valueQuantity": {"value": 13.8, "unit": "g/dL"}
                }}]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/FHIR/R4/Observation"))
            .and(query_param("patient", "p1"))
            .and(query_param("category", "vital-signs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceType": "Bundle",
                "entry": []
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_chart_aggregates_resources() {
        let server = MockServer::start().await;
        mount_chart_mocks(&server).await;

        let client = SmartClient::new(base_url(&server), "token-abc");
        let chart = client.fetch_chart("p1").await.unwrap();

        assert_eq!(chart.patient.display_name(), "Camila Lopez");
        assert_eq!(chart.medications.len(), 1);
        assert_eq!(chart.medications[0].display_name(), "lisinopril 10 MG");
        assert_eq!(chart.lab_results.len(), 1);
        assert_eq!(chart.lab_results[0].value_display(), "13.8 g/dL");
        assert!(chart.vital_signs.is_empty());
        assert_eq!(chart.item_count(), 2);
    }

    #[tokio::test]
    async fn chart_fetcher_maps_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/FHIR/R4/Patient/p1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let fetcher = SmartChartFetcher::new(base_url(&server));
        let token = TokenBundle {
            access_token: "stale".to_string(),
            patient_id: "p1".to_string(),
            expires_in_seconds: 3600,
            token_type: "Bearer".to_string(),
        };

        let err = fetcher.fetch_chart(&token).await.unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized));
    }

    #[tokio::test]
    async fn chart_fetcher_maps_other_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/FHIR/R4/Patient/p1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let fetcher = SmartChartFetcher::new(base_url(&server));
        let token = TokenBundle {
            access_token: "token".to_string(),
            patient_id: "p1".to_string(),
            expires_in_seconds: 3600,
            token_type: "Bearer".to_string(),
        };

        let err = fetcher.fetch_chart(&token).await.unwrap_err();
        match err {
            FetchError::Failed(msg) => assert!(msg.contains("500")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
