//! Partial FHIR R4 resource models.
//!
//! Only the fields the chart viewer consumes are modeled; everything else
//! the server sends is ignored on deserialization. Serialization skips
//! absent fields so created resources stay minimal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

// =============================================================================
// Datatypes
// =============================================================================

/// FHIR HumanName (given + family only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HumanName {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

/// FHIR Identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// FHIR ContactPoint (telecom entries).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// FHIR Coding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// FHIR CodeableConcept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
}

impl CodeableConcept {
    /// Human-readable label: `text` wins, then the first coding display.
    #[must_use]
    pub fn display(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or_else(|| self.coding.iter().find_map(|c| c.display.as_deref()))
    }
}

/// FHIR Quantity (value + unit only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Quantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Quantity {
    fn render(&self) -> String {
        match (&self.value, &self.unit) {
            (Some(v), Some(u)) => format!("{v} {u}"),
            (Some(v), None) => v.to_string(),
            (None, _) => String::new(),
        }
    }
}

// =============================================================================
// Patient
// =============================================================================

/// FHIR Patient resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Patient {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
}

impl Default for Patient {
    fn default() -> Self {
        Self {
            resource_type: "Patient".to_string(),
            id: None,
            name: Vec::new(),
            gender: None,
            birth_date: None,
            identifier: Vec::new(),
            telecom: Vec::new(),
        }
    }
}

impl Patient {
    /// "Given Family" from the first name entry, or "Unknown Patient".
    #[must_use]
    pub fn display_name(&self) -> String {
        let Some(name) = self.name.first() else {
            return "Unknown Patient".to_string();
        };
        let given = name.given.join(" ");
        let family = name.family.as_deref().unwrap_or("");
        let full = format!("{given} {family}");
        let full = full.trim();
        if full.is_empty() {
            "Unknown Patient".to_string()
        } else {
            full.to_string()
        }
    }

    /// First telecom value with `system == "phone"`.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.telecom
            .iter()
            .find(|t| t.system.as_deref() == Some("phone"))
            .and_then(|t| t.value.as_deref())
    }
}

// =============================================================================
// MedicationRequest
// =============================================================================

/// FHIR dosage instruction (narrative text only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DosageInstruction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// FHIR MedicationRequest resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicationRequest {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dosage_instruction: Vec<DosageInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Default for MedicationRequest {
    fn default() -> Self {
        Self {
            resource_type: "MedicationRequest".to_string(),
            id: None,
            medication_codeable_concept: None,
            authored_on: None,
            dosage_instruction: Vec::new(),
            status: None,
        }
    }
}

impl MedicationRequest {
    /// Medication label, or "Unknown Medication".
    #[must_use]
    pub fn display_name(&self) -> String {
        self.medication_codeable_concept
            .as_ref()
            .and_then(CodeableConcept::display)
            .unwrap_or("Unknown Medication")
            .to_string()
    }

    /// First dosage instruction text, if any.
    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.dosage_instruction.first().and_then(|d| d.text.as_deref())
    }
}

// =============================================================================
// Observation
// =============================================================================

/// FHIR Observation component (one reading of a multi-part observation,
/// e.g. the systolic half of a blood pressure).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservationComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
}

/// FHIR Observation resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Observation {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<ObservationComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
}

impl Default for Observation {
    fn default() -> Self {
        Self {
            resource_type: "Observation".to_string(),
            id: None,
            code: None,
            value_quantity: None,
            value_string: None,
            component: Vec::new(),
            effective_date_time: None,
            status: None,
            category: Vec::new(),
        }
    }
}

impl Observation {
    /// Observation label, or "Unknown".
    #[must_use]
    pub fn display_name(&self) -> String {
        self.code
            .as_ref()
            .and_then(CodeableConcept::display)
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Render the recorded value: a quantity with unit, a string value, or
    /// the components as "name: value" pairs. Falls back to
    /// "No value recorded".
    #[must_use]
    pub fn value_display(&self) -> String {
        if let Some(q) = &self.value_quantity {
            let rendered = q.render();
            if !rendered.is_empty() {
                return rendered;
            }
        }
        if let Some(s) = &self.value_string {
            return s.clone();
        }
        if !self.component.is_empty() {
            return self
                .component
                .iter()
                .map(|comp| {
                    let name = comp
                        .code
                        .as_ref()
                        .and_then(CodeableConcept::display)
                        .unwrap_or("");
                    let value = comp
                        .value_quantity
                        .as_ref()
                        .map(Quantity::render)
                        .unwrap_or_default();
                    format!("{name}: {value}")
                })
                .collect::<Vec<_>>()
                .join(", ");
        }
        "No value recorded".to_string()
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// FHIR searchset Bundle entry. The resource stays untyped until the
/// caller asks for a concrete type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

/// FHIR Bundle (searchset subset).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

impl Default for Bundle {
    fn default() -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            total: None,
            entry: Vec::new(),
        }
    }
}

impl Bundle {
    /// Decode every entry resource as `T`.
    pub fn resources<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>, CoreError> {
        self.entry
            .iter()
            .filter_map(|e| e.resource.clone())
            .map(|v| serde_json::from_value(v).map_err(CoreError::from))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patient_display_name() {
        let patient: Patient = serde_json::from_value(json!({
            "resourceType": "Patient",
            "id": "erXuFYUfucBZaryVksYEcMg3",
            "name": [{"given": ["Camila", "Maria"], "family": "Lopez"}],
            "gender": "female",
            "birthDate": "1987-09-12"
        }))
        .unwrap();

        assert_eq!(patient.display_name(), "Camila Maria Lopez");
        assert_eq!(patient.gender.as_deref(), Some("female"));
        assert_eq!(patient.birth_date.as_deref(), Some("1987-09-12"));
    }

    #[test]
    fn patient_display_name_fallbacks() {
        let no_name = Patient::default();
        assert_eq!(no_name.display_name(), "Unknown Patient");

        let given_only: Patient = serde_json::from_value(json!({
            "resourceType": "Patient",
            "name": [{"given": ["Jan"]}]
        }))
        .unwrap();
        assert_eq!(given_only.display_name(), "Jan");
    }

    #[test]
    fn patient_phone_picks_phone_telecom() {
        let patient: Patient = serde_json::from_value(json!({
            "resourceType": "Patient",
            "telecom": [
                {"system": "email", "value": "camila@example.com"},
                {"system": "phone", "value": "555-0100"}
            ]
        }))
        .unwrap();
        assert_eq!(patient.phone(), Some("555-0100"));
    }

    #[test]
    fn medication_display_prefers_text_then_coding() {
        let med: MedicationRequest = serde_json::from_value(json!({
            "resourceType": "MedicationRequest",
            "medicationCodeableConcept": {
                "coding": [{"display": "lisinopril 10 MG Oral Tablet"}]
            },
            "status": "active"
        }))
        .unwrap();
        assert_eq!(med.display_name(), "lisinopril 10 MG Oral Tablet");

        let unnamed = MedicationRequest::default();
        assert_eq!(unnamed.display_name(), "Unknown Medication");
    }

    #[test]
    fn observation_value_quantity() {
        let obs: Observation = serde_json::from_value(json!({
            "resourceType": "Observation",
            "code": {"text": "Hemoglobin"},
            "valueQuantity": {"value": 13.8, "unit": "g/dL"},
            "status": "final"
        }))
        .unwrap();
        assert_eq!(obs.display_name(), "Hemoglobin");
        assert_eq!(obs.value_display(), "13.8 g/dL");
    }

    #[test]
    fn observation_value_components() {
        let obs: Observation = serde_json::from_value(json!({
            "resourceType": "Observation",
            "code": {"text": "Blood Pressure"},
            "component": [
                {
                    "code": {"text": "Systolic"},
                    "valueQuantity": {"value": 120.0, "unit": "mm[Hg]"}
                },
                {
                    "code": {"text": "Diastolic"},
                    "valueQuantity": {"value": 80.0, "unit": "mm[Hg]"}
                }
            ]
        }))
        .unwrap();
        assert_eq!(
            obs.value_display(),
            "Systolic: 120 mm[Hg], Diastolic: 80 mm[Hg]"
        );
    }

    #[test]
    fn observation_value_fallback() {
        let obs = Observation::default();
        assert_eq!(obs.value_display(), "No value recorded");

        let text: Observation = serde_json::from_value(json!({
            "resourceType": "Observation",
            "valueString": "Negative"
        }))
        .unwrap();
        assert_eq!(text.value_display(), "Negative");
    }

    #[test]
    fn bundle_resource_extraction() {
        let bundle: Bundle = serde_json::from_value(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 2,
            "entry": [
                {"resource": {"resourceType": "Patient", "id": "a"}},
                {"resource": {"resourceType": "Patient", "id": "b"}}
            ]
        }))
        .unwrap();

        let patients: Vec<Patient> = bundle.resources().unwrap();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[1].id.as_deref(), Some("b"));
        assert_eq!(bundle.total, Some(2));
    }

    #[test]
    fn bundle_empty_entries() {
        let bundle: Bundle = serde_json::from_value(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 0
        }))
        .unwrap();
        let patients: Vec<Patient> = bundle.resources().unwrap();
        assert!(patients.is_empty());
    }

    #[test]
    fn patient_serialization_stays_minimal() {
        let patient = Patient {
            name: vec![HumanName {
                given: vec!["Ana".to_string()],
                family: Some("Silva".to_string()),
            }],
            gender: Some("female".to_string()),
            ..Patient::default()
        };
        let value = serde_json::to_value(&patient).unwrap();
        assert_json_diff::assert_json_eq!(
            value,
            json!({
                "resourceType": "Patient",
                "name": [{"given": ["Ana"], "family": "Silva"}],
                "gender": "female"
            })
        );
    }
}
