//! Enrollment request decoding
//!
//! Decoding only ever sees content that `EnvelopeVerifier` has already
//! verified and `PhaseDisambiguator` has already classified; it performs no
//! trust checks of its own.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::{envelope::SignedEnvelope, error::EnrollmentError, phase::Classified, phase::Phase};
use log::error;
use serde::Deserialize;

/// The device information plist a DEP device POSTs to the enrollment URL.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DepEnrollmentRequest {
    pub language: String,
    pub product: String,
    pub serial: String,
    pub udid: String,
    /// The OS build version, e.g. `20A362`.
    pub version: String,
    pub os_version: String,
    pub imei: Option<String>,
    pub meid: Option<String>,
    pub mdm_can_request_software_update: bool,
    pub software_update_device_id: Option<String>,
    pub supplemental_build_version: Option<String>,
    pub supplemental_os_version: Option<String>,
}

/// The device attributes returned by the OTA profile service payload.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct OtaEnrollmentRequest {
    #[serde(rename = "CHALLENGE")]
    pub challenge: Option<String>,
    #[serde(rename = "IMEI")]
    pub imei: Option<String>,
    #[serde(rename = "MEID")]
    pub meid: Option<String>,
    #[serde(rename = "PRODUCT")]
    pub product: String,
    #[serde(rename = "SERIAL")]
    pub serial: String,
    #[serde(rename = "UDID")]
    pub udid: String,
    #[serde(rename = "VERSION")]
    pub version: String,
    #[serde(rename = "NotOnConsole")]
    pub not_on_console: bool,
    #[serde(rename = "UserID")]
    pub user_id: Option<String>,
    #[serde(rename = "UserLongName")]
    pub user_long_name: Option<String>,
    #[serde(rename = "UserShortName")]
    pub user_short_name: Option<String>,
}

/// An OTA request together with the envelope it came in, so that later
/// processing can still see which certificate signed it.
#[derive(Clone, Debug)]
pub struct OtaPhase2Phase3Request {
    pub phase: Phase,
    pub request: OtaEnrollmentRequest,
    pub envelope: SignedEnvelope,
}

#[derive(Clone, Debug)]
pub enum EnrollmentRequest {
    /// A request that carries no payload (`InitialEnrollment` or
    /// `OtaInitial`).
    Unsigned(Phase),
    Dep(DepEnrollmentRequest),
    Ota(OtaPhase2Phase3Request),
}

impl EnrollmentRequest {
    pub fn phase(&self) -> Phase {
        match self {
            EnrollmentRequest::Unsigned(phase) => *phase,
            EnrollmentRequest::Dep(_) => Phase::DepEnrollment,
            EnrollmentRequest::Ota(ota) => ota.phase,
        }
    }
}

/// Decode the verified content of `envelope` according to `phase`.
pub fn decode(
    phase: Phase,
    envelope: SignedEnvelope,
) -> Result<EnrollmentRequest, EnrollmentError> {
    match phase {
        Phase::DepEnrollment => {
            let request: DepEnrollmentRequest = from_plist(phase, envelope.content())?;
            Ok(EnrollmentRequest::Dep(request))
        }
        Phase::OtaPhase2 | Phase::OtaPhase3 => {
            let request: OtaEnrollmentRequest = from_plist(phase, envelope.content())?;
            Ok(EnrollmentRequest::Ota(OtaPhase2Phase3Request {
                phase,
                request,
                envelope,
            }))
        }
        Phase::InitialEnrollment | Phase::OtaInitial => Err(EnrollmentError::MalformedPayload(
            format!("{} requests carry no payload", phase),
        )),
    }
}

/// Turn a classified request into an `EnrollmentRequest`, decoding the
/// payload of signed requests.
pub fn decode_classified(classified: Classified) -> Result<EnrollmentRequest, EnrollmentError> {
    match classified {
        Classified::Unsigned(phase) if !phase.is_signed() => Ok(EnrollmentRequest::Unsigned(phase)),
        Classified::Unsigned(phase) => Err(EnrollmentError::MalformedPayload(format!(
            "{} request arrived without an envelope",
            phase
        ))),
        Classified::Signed(phase, envelope) => decode(phase, envelope),
    }
}

fn from_plist<T>(phase: Phase, content: &[u8]) -> Result<T, EnrollmentError>
where
    T: for<'de> Deserialize<'de>,
{
    plist::from_bytes(content).map_err(|err| {
        error!("enrollment-server::decoder::decode failed to decode {} payload:{}", phase, err);
        EnrollmentError::MalformedPayload(format!("{}", err))
    })
}
