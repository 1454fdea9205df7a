use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use carelens_core::{MedicationRequest, Observation, Patient, PatientChart};

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_patients(patients: &[Patient]) {
    if patients.is_empty() {
        println!("No patients found.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Gender", "Birth Date", "Phone"]);
    for patient in patients {
        let name = patient.display_name();
        builder.push_record([
            patient.id.as_deref().unwrap_or("-"),
            name.as_str(),
            patient.gender.as_deref().unwrap_or("-"),
            patient.birth_date.as_deref().unwrap_or("-"),
            patient.phone().unwrap_or("-"),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("Total: {}", patients.len());
}

pub fn print_chart(chart: &PatientChart) {
    let patient = &chart.patient;
    println!();
    println!("{} {}", "Patient:".cyan(), patient.display_name());
    println!(
        "{} {}",
        "Gender:".cyan(),
        patient.gender.as_deref().unwrap_or("Not specified")
    );
    println!(
        "{} {}",
        "Date of Birth:".cyan(),
        patient.birth_date.as_deref().unwrap_or("Unknown")
    );
    if let Some(id) = patient.identifier.first().and_then(|i| i.value.as_deref()) {
        println!("{} {}", "Patient ID:".cyan(), id);
    }

    println!();
    println!("{} ({})", "Medications".bold(), chart.medications.len());
    if chart.medications.is_empty() {
        println!("No medications found.");
    } else {
        println!("{}", medications_table(&chart.medications));
    }

    println!();
    println!("{} ({})", "Lab Results".bold(), chart.lab_results.len());
    if chart.lab_results.is_empty() {
        println!("No lab results found.");
    } else {
        println!("{}", observations_table("Test", &chart.lab_results));
    }

    println!();
    println!("{} ({})", "Vital Signs".bold(), chart.vital_signs.len());
    if chart.vital_signs.is_empty() {
        println!("No vital signs found.");
    } else {
        println!("{}", observations_table("Vital Sign", &chart.vital_signs));
    }
}

pub(crate) fn medications_table(medications: &[MedicationRequest]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Medication", "Status", "Prescribed", "Instructions"]);
    for med in medications {
        let name = med.display_name();
        builder.push_record([
            name.as_str(),
            med.status.as_deref().unwrap_or("Unknown"),
            short_date(med.authored_on.as_deref()),
            med.instructions().unwrap_or("See prescriber"),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub(crate) fn observations_table(label: &str, observations: &[Observation]) -> String {
    let mut builder = Builder::default();
    builder.push_record([label, "Value", "Status", "Date"]);
    for obs in observations {
        let name = obs.display_name();
        let value = obs.value_display();
        builder.push_record([
            name.as_str(),
            value.as_str(),
            obs.status.as_deref().unwrap_or("Unknown"),
            short_date(obs.effective_date_time.as_deref()),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Date part of a FHIR date/dateTime, or "Unknown".
fn short_date(value: Option<&str>) -> &str {
    match value {
        Some(v) => v.split('T').next().unwrap_or(v),
        None => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_date_strips_time() {
        assert_eq!(short_date(Some("2025-03-01T10:30:00Z")), "2025-03-01");
        assert_eq!(short_date(Some("2025-03-01")), "2025-03-01");
        assert_eq!(short_date(None), "Unknown");
    }

    #[test]
    fn medications_table_renders_rows() {
        let med: MedicationRequest = serde_json::from_value(json!({
            "resourceType": "MedicationRequest",
            "medicationCodeableConcept": {"text": "metformin 500 MG"},
            "status": "active",
            "authoredOn": "2025-01-15T08:00:00Z",
            "dosageInstruction": [{"text": "Twice daily with food"}]
        }))
        .unwrap();

        let table = medications_table(&[med]);
        assert!(table.contains("metformin 500 MG"));
        assert!(table.contains("active"));
        assert!(table.contains("2025-01-15"));
        assert!(table.contains("Twice daily with food"));
    }

    #[test]
    fn observations_table_renders_values() {
        let obs: Observation = serde_json::from_value(json!({
            "resourceType": "Observation",
            "code": {"text": "Heart Rate"},
            "valueQuantity": {"value": 72.0, "unit": "/min"},
            "status": "final",
            "effectiveDateTime": "2025-02-20T09:00:00Z"
        }))
        .unwrap();

        let table = observations_table("Vital Sign", &[obs]);
        assert!(table.contains("Heart Rate"));
        assert!(table.contains("72 /min"));
        assert!(table.contains("2025-02-20"));
    }
}
