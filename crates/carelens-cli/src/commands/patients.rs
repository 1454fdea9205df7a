use anyhow::Result;
use colored::Colorize;

use carelens_fhir::{FhirClient, PatientInput};

use crate::cli::PatientFormArgs;
use crate::output::{print_patients, print_success};

impl From<&PatientFormArgs> for PatientInput {
    fn from(form: &PatientFormArgs) -> Self {
        Self {
            name: form.name.clone(),
            gender: form.gender.clone(),
            birth_date: form.birth_date.clone(),
            phone: form.phone.clone(),
        }
    }
}

pub async fn list(client: &FhirClient) -> Result<()> {
    let patients = client.list_patients().await?;
    print_patients(&patients);
    Ok(())
}

pub async fn create(client: &FhirClient, form: &PatientFormArgs) -> Result<()> {
    client.create_patient(&form.into()).await?;
    print_success(&format!("Created patient {}", form.name.cyan()));
    Ok(())
}

pub async fn update(client: &FhirClient, id: &str, form: &PatientFormArgs) -> Result<()> {
    client.update_patient(id, &form.into()).await?;
    print_success(&format!("Updated patient {}", id.cyan()));
    Ok(())
}

pub async fn delete(client: &FhirClient, id: &str) -> Result<()> {
    client.delete_patient(id).await?;
    print_success(&format!("Deleted patient {}", id.cyan()));
    Ok(())
}
