//! OpenSSL PKCS#7 envelope backend
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use super::{Certificate, EnvelopeBackend};
use crate::error::EnrollmentError;
use log::debug;
use openssl::{
    error::ErrorStack,
    pkcs7::{Pkcs7, Pkcs7Flags},
    stack::Stack,
    x509::{store::X509StoreBuilder, X509},
};

/// Verifies attached CMS signatures with OpenSSL.
///
/// Only the signature over the content is checked here; chain validation is
/// left to the `SignerClassifier`, so `Pkcs7Flags::NOVERIFY` is always set.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pkcs7Backend;

impl Pkcs7Backend {
    pub fn new() -> Self {
        Pkcs7Backend
    }

    fn parse(raw: &[u8]) -> Result<Pkcs7, EnrollmentError> {
        Pkcs7::from_der(raw).map_err(|err| EnrollmentError::MalformedEnvelope(format!("{}", err)))
    }
}

/// OpenSSL reasons meaning the envelope is signed-data but carries no usable
/// signer: no signer records at all, or a signer whose certificate is absent.
const NO_SIGNER_REASONS: &[&str] = &["no signers", "signer certificate not found"];

fn lacks_signer(err: &ErrorStack) -> bool {
    err.errors()
        .iter()
        .filter_map(|error| error.reason())
        .any(|reason| NO_SIGNER_REASONS.contains(&reason))
}

impl EnvelopeBackend for Pkcs7Backend {
    fn signers(&self, raw: &[u8]) -> Result<Vec<Certificate>, EnrollmentError> {
        let pkcs7 = Self::parse(raw)?;
        let extra_certs = Stack::<X509>::new()?;

        let signers = match pkcs7.signers(&extra_certs, Pkcs7Flags::empty()) {
            Ok(signers) => signers,
            Err(err) if lacks_signer(&err) => {
                debug!("enrollment-server::crypto::pkcs7::signers no signers found:{}", err);
                return Ok(Vec::new());
            }
            Err(err) => return Err(EnrollmentError::MalformedEnvelope(format!("{}", err))),
        };

        signers
            .iter()
            .map(|certificate| -> Result<Certificate, EnrollmentError> {
                Ok(Certificate::from_der(certificate.to_der()?))
            })
            .collect()
    }

    fn verify_signature(&self, raw: &[u8]) -> Result<Vec<u8>, EnrollmentError> {
        let pkcs7 = Self::parse(raw)?;
        let extra_certs = Stack::<X509>::new()?;
        let store = X509StoreBuilder::new()?.build();

        let mut content = Vec::new();
        pkcs7
            .verify(
                &extra_certs,
                &store,
                None,
                Some(&mut content),
                Pkcs7Flags::NOVERIFY,
            )
            .map_err(|err| EnrollmentError::InvalidSignature(format!("{}", err)))?;
        Ok(content)
    }
}
