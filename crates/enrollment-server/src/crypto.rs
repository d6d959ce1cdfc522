//! Cryptographic collaborators
//!
//! The enrollment pipeline never looks inside a certificate or a CMS
//! structure itself.  It asks an `EnvelopeBackend` for the signers and the
//! signed content of an envelope, and a `SignerClassifier` which authority a
//! signer certificate chains to.  The OpenSSL-backed implementations live in
//! the submodules.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

pub mod anchor;
pub mod pkcs7;

pub use self::{anchor::AnchorClassifier, anchor::CertificateAuthority, pkcs7::Pkcs7Backend};

use crate::{error::EnrollmentError, phase::Phase};

/// A DER encoded X.509 certificate taken from a signer record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    #[inline]
    pub fn from_der(der: Vec<u8>) -> Self {
        Certificate(der)
    }

    #[inline]
    pub fn der(&self) -> &[u8] {
        &self.0
    }
}

/// Parsing and signature verification of CMS signed-data envelopes.
pub trait EnvelopeBackend: Send + Sync {
    /// Parse `raw` and return the certificate of every signer record, in
    /// order.  Fails with `MalformedEnvelope` if `raw` is not a signed
    /// envelope at all.
    fn signers(&self, raw: &[u8]) -> Result<Vec<Certificate>, EnrollmentError>;

    /// Check the signature of every signer over the encapsulated content and
    /// return that content.  Fails with `InvalidSignature`.
    fn verify_signature(&self, raw: &[u8]) -> Result<Vec<u8>, EnrollmentError>;
}

/// Decides which trust anchor a signer certificate chains to.
pub trait SignerClassifier: Send + Sync {
    /// Whether `certificate` chains to the Apple Device CA.
    fn chains_to_device_authority(&self, certificate: &Certificate) -> bool;

    /// `Phase::OtaPhase2` for device identities issued by the Apple Device
    /// CA, `Phase::OtaPhase3` for identities issued by our own enrollment
    /// CA, `None` otherwise.
    fn ota_phase(&self, certificate: &Certificate) -> Option<Phase>;
}
