use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default local FHIR server used by the patient CRUD screen.
pub const DEFAULT_FHIR_URL: &str = "http://localhost:8080/fhir";

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    pub fhir_server: Option<String>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    // CARELENS_CONFIG_DIR overrides the default location (used in tests).
    if let Ok(dir) = std::env::var("CARELENS_CONFIG_DIR") {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir)?;
        return Ok(dir);
    }
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".carelens");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_all() -> Result<ConfigFile> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)?;
    let cfg: ConfigFile = toml::from_str(&content)?;
    Ok(cfg)
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all()?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all()?;
    all.insert(
        profile.to_string(),
        ProfileConfig {
            fhir_server: config.fhir_server.clone(),
        },
    );
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path()?, content)?;
    Ok(())
}

/// Resolve the local FHIR server URL: CLI flag / env var, then the
/// profile config, then the default localhost server.
pub fn resolve_fhir_server(cli_server: &Option<String>, profile: &str) -> Result<String> {
    if let Some(s) = cli_server {
        return Ok(s.clone());
    }
    let cfg = load_profile(profile)?;
    if let Some(s) = cfg.fhir_server {
        return Ok(s);
    }
    Ok(DEFAULT_FHIR_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_round_trip_and_resolution() {
        let dir = tempfile::tempdir().unwrap();
        // set_var is unsafe in edition 2024; this test is the only one
        // touching this variable.
        unsafe {
            std::env::set_var("CARELENS_CONFIG_DIR", dir.path());
        }

        assert_eq!(
            resolve_fhir_server(&None, "default").unwrap(),
            DEFAULT_FHIR_URL
        );

        save_profile(
            "default",
            &ProfileConfig {
                fhir_server: Some("http://localhost:9000/fhir".to_string()),
            },
        )
        .unwrap();

        let loaded = load_profile("default").unwrap();
        assert_eq!(
            loaded.fhir_server.as_deref(),
            Some("http://localhost:9000/fhir")
        );

        assert_eq!(
            resolve_fhir_server(&None, "default").unwrap(),
            "http://localhost:9000/fhir"
        );
        assert_eq!(
            resolve_fhir_server(&Some("http://other:1/fhir".to_string()), "default").unwrap(),
            "http://other:1/fhir"
        );

        unsafe {
            std::env::remove_var("CARELENS_CONFIG_DIR");
        }
    }
}
