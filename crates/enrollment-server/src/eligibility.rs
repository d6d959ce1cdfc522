//! OS version eligibility
//!
//! Devices running a build older than the configured minimum are turned
//! away with the structured "software update required" error that Apple
//! devices understand.
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
use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// Machine readable code of the OS-too-old rejection.
pub const SOFTWARE_UPDATE_REQUIRED: &str = "com.apple.softwareupdate.required";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OSTooOldDetails {
    #[serde(rename = "OSVersion")]
    pub os_version: String,
    #[serde(rename = "BuildVersion", skip_serializing_if = "String::is_empty")]
    pub build_version: String,
}

/// The structured rejection returned with a 403 to devices whose build is
/// too old.  Only `EligibilityGate` creates these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OSTooOldError {
    code: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
    details: OSTooOldDetails,
}

impl OSTooOldError {
    fn new(os_version: &str, build_version: &str, minimum: &BuildVersion) -> Self {
        OSTooOldError {
            code: SOFTWARE_UPDATE_REQUIRED,
            description: format!(
                "OS build {} is older than the minimum supported build {}",
                build_version, minimum
            ),
            message: "A software update is required before this device can enroll.".to_string(),
            details: OSTooOldDetails {
                os_version: os_version.to_string(),
                build_version: build_version.to_string(),
            },
        }
    }

    #[inline]
    pub fn code(&self) -> &str {
        self.code
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn details(&self) -> &OSTooOldDetails {
        &self.details
    }
}

impl fmt::Display for OSTooOldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "this OS is too old")
    }
}

/// Compares reported builds against a minimum parsed once at start-up.
#[derive(Clone, Debug)]
pub struct EligibilityGate {
    minimum: BuildVersion,
}

impl EligibilityGate {
    pub fn new(minimum: &str) -> Result<Self, EnrollmentError> {
        let minimum = BuildVersion::parse(minimum)?;
        info!("Minimum OS build for enrollment is {}", minimum);
        Ok(EligibilityGate { minimum })
    }

    #[inline]
    pub fn minimum(&self) -> &BuildVersion {
        &self.minimum
    }

    /// Reject the device with `OSTooOld` if `build_version` sorts before the
    /// minimum.  `os_version` is only echoed back in the rejection.
    pub fn check(&self, os_version: &str, build_version: &str) -> Result<(), EnrollmentError> {
        let reported = BuildVersion::parse(build_version)?;
        if reported.less_than(&self.minimum) {
            warn!(
                "enrollment-server::eligibility::check build {} ({}) is older than {}",
                build_version, os_version, self.minimum
            );
            return Err(EnrollmentError::OSTooOld(OSTooOldError::new(
                os_version,
                build_version,
                &self.minimum,
            )));
        }
        Ok(())
    }
}

/// One-shot form of `EligibilityGate::check`.  Parse failures of either
/// version surface as `InvalidVersionFormat` naming the operand.
pub fn check_eligible(
    os_version: &str,
    reported_build: &str,
    minimum_build: &str,
) -> Result<(), EnrollmentError> {
    if build_version::less_than(reported_build, minimum_build)? {
        let minimum = BuildVersion::parse(minimum_build)?;
        return Err(EnrollmentError::OSTooOld(OSTooOldError::new(
            os_version,
            reported_build,
            &minimum,
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_old_build_rejected() {
        match check_eligible("14.0", "20A362", "20B101") {
            Err(EnrollmentError::OSTooOld(rejection)) => {
                assert_eq!(rejection.code(), SOFTWARE_UPDATE_REQUIRED);
                assert_eq!(rejection.details().os_version, "14.0");
                assert_eq!(rejection.details().build_version, "20A362");
                assert!(rejection.description().contains("20B101"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_equal_and_newer_builds_pass() {
        let gate = EligibilityGate::new("20B101").unwrap();
        assert!(gate.check("14.2", "20B101").is_ok());
        assert!(gate.check("14.2", "20B101a").is_ok());
        assert!(gate.check("15.0", "21A329").is_ok());
        assert!(gate.check("14.1", "20B100").is_err());
    }

    #[test]
    fn test_unparsable_versions() {
        match check_eligible("14.0", "14.0", "20B101") {
            Err(EnrollmentError::InvalidVersionFormat(err)) => assert!(err.is_invalid_format()),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(EligibilityGate::new("latest").is_err());
        match EligibilityGate::new("20B101").unwrap().check("14.0", "") {
            Err(EnrollmentError::InvalidVersionFormat(_)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_rejection_serialization() {
        let rejection = match check_eligible("14.0", "20A362", "20B101") {
            Err(EnrollmentError::OSTooOld(rejection)) => rejection,
            other => panic!("unexpected result {:?}", other),
        };
        let json: serde_json::Value = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["code"], SOFTWARE_UPDATE_REQUIRED);
        assert_eq!(json["details"]["OSVersion"], "14.0");
        assert_eq!(json["details"]["BuildVersion"], "20A362");
        assert!(json["message"].is_string());
    }
}
