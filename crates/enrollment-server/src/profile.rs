//! Profile service
//!
//! What profile a device receives is a business decision outside the
//! enrollment pipeline.  `ProfileService` is the seam; `StaticProfileService`
//! serves pre-signed profiles loaded from disk once at start-up.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::{config::Config, decoder::EnrollmentRequest, error::EnrollmentError, phase::Phase};
use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub trait ProfileService: Send + Sync {
    /// The profile bytes to return for a decoded (and eligible) request.
    fn profile_for(&self, request: &EnrollmentRequest) -> Result<Vec<u8>, EnrollmentError>;
}

/// Serves one fixed profile per phase.
#[derive(Clone, Debug, Default)]
pub struct StaticProfileService {
    enrollment: Vec<u8>,
    ota: Option<Vec<u8>>,
    ota_phase2: Option<Vec<u8>>,
    ota_phase3: Option<Vec<u8>>,
}

impl StaticProfileService {
    /// A service answering both the initial GET and DEP enrollment with
    /// `enrollment`.  OTA phases are unset until configured.
    pub fn new(enrollment: Vec<u8>) -> Self {
        StaticProfileService {
            enrollment,
            ..Default::default()
        }
    }

    pub fn with_ota_profiles(
        mut self,
        ota: Option<Vec<u8>>,
        ota_phase2: Option<Vec<u8>>,
        ota_phase3: Option<Vec<u8>>,
    ) -> Self {
        self.ota = ota;
        self.ota_phase2 = ota_phase2;
        self.ota_phase3 = ota_phase3;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, EnrollmentError> {
        let enrollment = read_profile(&config.enrollment_profile)?;
        let optional =
            |path: &Option<PathBuf>| -> Result<Option<Vec<u8>>, EnrollmentError> {
                path.as_ref().map(|path| read_profile(path)).transpose()
            };
        Ok(StaticProfileService::new(enrollment).with_ota_profiles(
            optional(&config.ota_profile)?,
            optional(&config.ota_phase2_profile)?,
            optional(&config.ota_phase3_profile)?,
        ))
    }
}

fn read_profile(path: &Path) -> Result<Vec<u8>, EnrollmentError> {
    info!("Loading profile {:?}", path);
    let profile = fs::read(path)?;
    if profile.is_empty() {
        return Err(EnrollmentError::ConfigError(format!("profile {:?} is empty", path)));
    }
    Ok(profile)
}

impl ProfileService for StaticProfileService {
    fn profile_for(&self, request: &EnrollmentRequest) -> Result<Vec<u8>, EnrollmentError> {
        let phase = request.phase();
        let profile = match phase {
            Phase::InitialEnrollment | Phase::DepEnrollment => Some(&self.enrollment),
            Phase::OtaInitial => self.ota.as_ref(),
            Phase::OtaPhase2 => self.ota_phase2.as_ref(),
            Phase::OtaPhase3 => self.ota_phase3.as_ref(),
        };
        profile.cloned().ok_or_else(|| {
            EnrollmentError::ProfileError(format!("no profile configured for {}", phase))
        })
    }
}
