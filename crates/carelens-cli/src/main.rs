mod browser;
mod cli;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use carelens_fhir::FhirClient;

use cli::{Cli, Commands, ConfigCommands, PatientCommands};
use output::{print_error, print_success};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // .env is optional; only complain when it exists but cannot be read.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }
    init_tracing();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Login(args) => commands::login::login(args.port).await,
        Commands::Relay(args) => commands::relay::run(args.port).await,
        Commands::Patients(args) => {
            let server = config::resolve_fhir_server(&cli.fhir_server, &cli.profile)?;
            let client = FhirClient::new(&server)?;
            match &args.command {
                PatientCommands::List => commands::patients::list(&client).await,
                PatientCommands::Create(form) => commands::patients::create(&client, form).await,
                PatientCommands::Update(args) => {
                    commands::patients::update(&client, &args.id, &args.form).await
                }
                PatientCommands::Delete(args) => {
                    commands::patients::delete(&client, &args.id).await
                }
            }
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                let cfg = config::load_profile(&cli.profile)?;
                println!("{}: {}", "Profile".cyan(), cli.profile);
                println!(
                    "{}: {}",
                    "FHIR server".cyan(),
                    cfg.fhir_server
                        .as_deref()
                        .unwrap_or(config::DEFAULT_FHIR_URL)
                );
                Ok(())
            }
            ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(&cli.profile)?;
                match set_args.key.as_str() {
                    "fhir-server" => cfg.fhir_server = Some(set_args.value.clone()),
                    other => {
                        anyhow::bail!("Unknown config key: {other}. Valid keys: fhir-server")
                    }
                }
                config::save_profile(&cli.profile, &cfg)?;
                print_success(&format!("Set {} = {}", set_args.key, set_args.value));
                Ok(())
            }
        },
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
