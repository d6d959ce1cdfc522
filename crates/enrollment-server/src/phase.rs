//! Protocol phase disambiguation
//!
//! Several enrollment phases share an endpoint and an envelope shape.  In
//! Apple's over-the-air design phases 2 and 3 are POSTed to the same URL
//! with identical payloads; the only differentiator is which certificate
//! signed the CMS body.  Classification is therefore driven by the signer
//! certificate and never by payload fields.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::{
    crypto::SignerClassifier,
    envelope::{EnvelopeVerifier, SignedEnvelope},
    error::EnrollmentError,
};
use actix_web::http::Method;
use log::{error, info};
use std::{fmt, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Unsigned GET on the enrollment endpoint, served before any
    /// device-signed payload exists.
    InitialEnrollment,
    /// POST of a DEP enrollment request signed by an Apple device identity.
    DepEnrollment,
    /// Request for the OTA profile-service payload.  Carries no body.
    OtaInitial,
    /// OTA request signed by the Apple-issued device identity.
    OtaPhase2,
    /// OTA request signed by the identity we issued in phase 2.
    OtaPhase3,
}

impl Phase {
    /// Whether requests in this phase arrive as a signed envelope.
    pub fn is_signed(&self) -> bool {
        match self {
            Phase::InitialEnrollment | Phase::OtaInitial => false,
            Phase::DepEnrollment | Phase::OtaPhase2 | Phase::OtaPhase3 => true,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::InitialEnrollment => "initial enrollment",
            Phase::DepEnrollment => "DEP enrollment",
            Phase::OtaInitial => "OTA initial",
            Phase::OtaPhase2 => "OTA phase 2",
            Phase::OtaPhase3 => "OTA phase 3",
        };
        f.write_str(name)
    }
}

/// The three wire endpoints of the enrollment service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Enroll,
    OtaEnroll,
    OtaPhase2Phase3,
}

/// An inbound request after method dispatch, verification and
/// classification.
#[derive(Debug)]
pub enum Classified {
    Unsigned(Phase),
    Signed(Phase, SignedEnvelope),
}

impl Classified {
    pub fn phase(&self) -> Phase {
        match self {
            Classified::Unsigned(phase) | Classified::Signed(phase, _) => *phase,
        }
    }
}

#[derive(Clone)]
pub struct PhaseDisambiguator {
    verifier: EnvelopeVerifier,
    classifier: Arc<dyn SignerClassifier>,
}

impl PhaseDisambiguator {
    pub fn new(verifier: EnvelopeVerifier, classifier: Arc<dyn SignerClassifier>) -> Self {
        PhaseDisambiguator {
            verifier,
            classifier,
        }
    }

    /// Decide the phase of an already verified envelope received on
    /// `endpoint`, looking only at its signer certificate.
    pub fn classify(
        &self,
        endpoint: Endpoint,
        envelope: &SignedEnvelope,
    ) -> Result<Phase, EnrollmentError> {
        match endpoint {
            Endpoint::Enroll => {
                if self.classifier.chains_to_device_authority(envelope.signer()) {
                    Ok(Phase::DepEnrollment)
                } else {
                    Err(EnrollmentError::UntrustedSigner("not signed by Apple Device CA"))
                }
            }
            Endpoint::OtaPhase2Phase3 => self.classifier.ota_phase(envelope.signer()).ok_or(
                EnrollmentError::UntrustedSigner("not signed by a known OTA enrollment authority"),
            ),
            Endpoint::OtaEnroll => Err(EnrollmentError::MalformedEnvelope(
                "the OTA profile endpoint takes no signed envelope".to_string(),
            )),
        }
    }

    /// Dispatch on `method`, verify `body` where the endpoint expects a
    /// signed envelope, and classify the result.
    pub fn classify_request(
        &self,
        endpoint: Endpoint,
        method: &Method,
        body: &[u8],
    ) -> Result<Classified, EnrollmentError> {
        let classified = match endpoint {
            Endpoint::Enroll if *method == Method::GET => {
                Classified::Unsigned(Phase::InitialEnrollment)
            }
            Endpoint::Enroll | Endpoint::OtaPhase2Phase3 if *method == Method::POST => {
                self.verify_and_classify(endpoint, body)?
            }
            Endpoint::OtaEnroll => Classified::Unsigned(Phase::OtaInitial),
            _ => return Err(unsupported(endpoint, method)),
        };
        info!(
            "enrollment-server::phase::classify_request {:?} request classified as {}",
            endpoint,
            classified.phase()
        );
        Ok(classified)
    }

    fn verify_and_classify(
        &self,
        endpoint: Endpoint,
        body: &[u8],
    ) -> Result<Classified, EnrollmentError> {
        let envelope = self.verifier.verify(body)?;
        let phase = self.classify(endpoint, &envelope).map_err(|err| {
            error!("enrollment-server::phase::classify {:?} rejected signer:{}", endpoint, err);
            err
        })?;
        Ok(Classified::Signed(phase, envelope))
    }
}

fn unsupported(endpoint: Endpoint, method: &Method) -> EnrollmentError {
    error!(
        "enrollment-server::phase::classify_request {:?} unsupported method {}",
        endpoint, method
    );
    EnrollmentError::UnsupportedMethod(method.to_string())
}
