//! Signed-envelope verification
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
    crypto::{Certificate, EnvelopeBackend},
    error::EnrollmentError,
};
use log::error;
use std::sync::Arc;

/// An envelope whose signature has been checked and which carries exactly
/// one signer.  Nothing else in the crate can construct one.
#[derive(Clone, Debug)]
pub struct SignedEnvelope {
    raw: Vec<u8>,
    content: Vec<u8>,
    signer: Certificate,
}

impl SignedEnvelope {
    /// The verified encapsulated content.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[inline]
    pub fn signer(&self) -> &Certificate {
        &self.signer
    }

    /// The envelope exactly as received.
    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

#[derive(Clone)]
pub struct EnvelopeVerifier {
    backend: Arc<dyn EnvelopeBackend>,
}

impl EnvelopeVerifier {
    pub fn new(backend: Arc<dyn EnvelopeBackend>) -> Self {
        EnvelopeVerifier { backend }
    }

    /// Parse and verify `raw`.
    ///
    /// The signer count is checked before any signature, so an envelope with
    /// no signer or several signers always fails with `InvalidSigner`.
    pub fn verify(&self, raw: &[u8]) -> Result<SignedEnvelope, EnrollmentError> {
        let mut signers = self.backend.signers(raw).map_err(|err| {
            error!("enrollment-server::envelope::verify failed to parse envelope:{}", err);
            err
        })?;
        if signers.len() != 1 {
            error!(
                "enrollment-server::envelope::verify expected one signer, found {}",
                signers.len()
            );
            return Err(EnrollmentError::InvalidSigner(signers.len()));
        }

        let content = self.backend.verify_signature(raw).map_err(|err| {
            error!("enrollment-server::envelope::verify signature check failed:{}", err);
            err
        })?;

        Ok(SignedEnvelope {
            raw: raw.to_vec(),
            content,
            signer: signers.remove(0),
        })
    }
}
