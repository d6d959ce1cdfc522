//! Server configuration
//!
//! The configuration is read once at start-up from a JSON file and is never
//! mutated afterwards.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::error::EnrollmentError;
use build_version::BuildVersion;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// PEM files holding the Apple Device CA certificate(s).
    pub device_ca_certificates: Vec<PathBuf>,
    /// PEM files holding the CA that issues our OTA phase 3 identities.
    #[serde(default)]
    pub enrollment_ca_certificates: Vec<PathBuf>,
    /// Devices reporting an older build are refused enrollment.
    #[serde(default)]
    pub minimum_build_version: Option<String>,
    pub enrollment_profile: PathBuf,
    #[serde(default)]
    pub ota_profile: Option<PathBuf>,
    #[serde(default)]
    pub ota_phase2_profile: Option<PathBuf>,
    #[serde(default)]
    pub ota_phase3_profile: Option<PathBuf>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, EnrollmentError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EnrollmentError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), EnrollmentError> {
        if self.device_ca_certificates.is_empty() {
            return Err(EnrollmentError::ConfigError(
                "at least one Apple Device CA certificate is required".to_string(),
            ));
        }
        if let Some(minimum) = &self.minimum_build_version {
            BuildVersion::parse(minimum).map_err(|err| {
                EnrollmentError::ConfigError(format!("minimum_build_version: {}", err))
            })?;
        }
        Ok(())
    }
}
