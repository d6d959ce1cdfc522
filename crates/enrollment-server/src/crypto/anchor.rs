//! Trust anchors and signer classification
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use super::{Certificate, SignerClassifier};
use crate::{error::EnrollmentError, phase::Phase};
use log::{debug, info};
use openssl::{
    stack::Stack,
    x509::{
        store::{X509Store, X509StoreBuilder},
        verify::X509VerifyFlags,
        X509StoreContext, X509,
    },
};
use std::{fs, path::Path};

/// A set of trusted certificates that signer certificates are validated
/// against.
///
/// Anchors need not be self-signed: the Apple iPhone Device CA is itself an
/// intermediate, so partial chains ending at any anchor are accepted.
pub struct CertificateAuthority {
    store: X509Store,
    anchors: usize,
}

impl CertificateAuthority {
    /// Build an authority from one or more PEM encoded certificates.
    pub fn from_pem(pem: &[u8]) -> Result<Self, EnrollmentError> {
        let certificates = X509::stack_from_pem(pem)?;
        if certificates.is_empty() {
            return Err(EnrollmentError::ConfigError(
                "no certificates found in PEM data".to_string(),
            ));
        }
        Self::from_certificates(certificates)
    }

    /// Build an authority from every certificate in every PEM file listed.
    pub fn from_pem_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, EnrollmentError> {
        let mut certificates = Vec::new();
        for path in paths {
            info!("Loading trust anchor {:?}", path.as_ref());
            let pem = fs::read(path)?;
            certificates.append(&mut X509::stack_from_pem(&pem)?);
        }
        if certificates.is_empty() {
            return Err(EnrollmentError::ConfigError(
                "no trust anchor certificates configured".to_string(),
            ));
        }
        Self::from_certificates(certificates)
    }

    pub fn from_certificates(certificates: Vec<X509>) -> Result<Self, EnrollmentError> {
        let anchors = certificates.len();
        let mut builder = X509StoreBuilder::new()?;
        builder.set_flags(X509VerifyFlags::PARTIAL_CHAIN)?;
        for certificate in certificates {
            builder.add_cert(certificate)?;
        }
        Ok(CertificateAuthority {
            store: builder.build(),
            anchors,
        })
    }

    /// Number of anchor certificates in this authority.
    #[inline]
    pub fn len(&self) -> usize {
        self.anchors
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.anchors == 0
    }

    /// Check that `certificate` chains to one of our anchors.
    pub fn verify(&self, certificate: &Certificate) -> Result<(), EnrollmentError> {
        let certificate = X509::from_der(certificate.der())
            .map_err(|err| EnrollmentError::MalformedEnvelope(format!("{}", err)))?;
        let chain = Stack::<X509>::new()?;
        let mut context = X509StoreContext::new()?;
        let (verified, reason) = context.init(&self.store, &certificate, &chain, |context| {
            let verified = context.verify_cert()?;
            Ok((verified, context.error().error_string()))
        })?;
        if verified {
            Ok(())
        } else {
            debug!(
                "enrollment-server::crypto::anchor::verify chain validation failed:{}",
                reason
            );
            Err(EnrollmentError::UntrustedSigner("certificate does not chain to a trust anchor"))
        }
    }
}

/// Classifies signers by trying the Apple Device CA and, if configured, the
/// CA that issued our own OTA enrollment identities.
pub struct AnchorClassifier {
    device_authority: CertificateAuthority,
    enrollment_authority: Option<CertificateAuthority>,
}

impl AnchorClassifier {
    pub fn new(
        device_authority: CertificateAuthority,
        enrollment_authority: Option<CertificateAuthority>,
    ) -> Self {
        AnchorClassifier {
            device_authority,
            enrollment_authority,
        }
    }
}

impl SignerClassifier for AnchorClassifier {
    fn chains_to_device_authority(&self, certificate: &Certificate) -> bool {
        self.device_authority.verify(certificate).is_ok()
    }

    fn ota_phase(&self, certificate: &Certificate) -> Option<Phase> {
        if self.chains_to_device_authority(certificate) {
            return Some(Phase::OtaPhase2);
        }
        match &self.enrollment_authority {
            Some(authority) if authority.verify(certificate).is_ok() => Some(Phase::OtaPhase3),
            _ => None,
        }
    }
}
