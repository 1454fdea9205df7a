use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "carelens")]
#[command(about = "Carelens — SMART on FHIR patient chart viewer")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Local FHIR server base URL (overrides config and CARELENS_FHIR_URL env var)
    #[arg(long, global = true, env = "CARELENS_FHIR_URL")]
    pub fhir_server: Option<String>,

    /// Config profile name
    #[arg(
        short,
        long,
        global = true,
        env = "CARELENS_PROFILE",
        default_value = "default"
    )]
    pub profile: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with the provider and show the patient chart
    Login(LoginArgs),
    /// Run the OAuth callback relay in the foreground
    Relay(RelayArgs),
    /// Manage patients on the local FHIR server
    Patients(PatientsArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Callback relay port (must match the registered redirect URI)
    #[arg(long, default_value_t = carelens_relay::DEFAULT_RELAY_PORT)]
    pub port: u16,
}

#[derive(clap::Args)]
pub struct RelayArgs {
    /// Port to listen on
    #[arg(long, default_value_t = carelens_relay::DEFAULT_RELAY_PORT)]
    pub port: u16,
}

#[derive(clap::Args)]
pub struct PatientsArgs {
    #[command(subcommand)]
    pub command: PatientCommands,
}

#[derive(Subcommand)]
pub enum PatientCommands {
    /// List patients
    List,
    /// Create a patient
    Create(PatientFormArgs),
    /// Update a patient
    Update(PatientUpdateArgs),
    /// Delete a patient
    Delete(PatientDeleteArgs),
}

#[derive(clap::Args)]
pub struct PatientFormArgs {
    /// Full name (the last word becomes the family name)
    #[arg(long)]
    pub name: String,
    /// Administrative gender (male, female, other, unknown)
    #[arg(long)]
    pub gender: String,
    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    pub birth_date: String,
    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(clap::Args)]
pub struct PatientUpdateArgs {
    /// Patient id
    pub id: String,
    #[command(flatten)]
    pub form: PatientFormArgs,
}

#[derive(clap::Args)]
pub struct PatientDeleteArgs {
    /// Patient id
    pub id: String,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (fhir-server)
    pub key: String,
    /// Value
    pub value: String,
}
