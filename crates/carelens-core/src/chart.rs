//! Aggregated patient chart returned by an authenticated fetch.

use crate::resource::{MedicationRequest, Observation, Patient};

/// Everything the viewer shows for one patient: demographics plus the
/// medication, lab and vital-sign lists, newest first as returned by the
/// server's `_sort` parameters.
#[derive(Debug, Clone, Default)]
pub struct PatientChart {
    pub patient: Patient,
    pub medications: Vec<MedicationRequest>,
    pub lab_results: Vec<Observation>,
    pub vital_signs: Vec<Observation>,
}

impl PatientChart {
    /// Total number of chart line items (excluding demographics).
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.medications.len() + self.lab_results.len() + self.vital_signs.len()
    }
}
