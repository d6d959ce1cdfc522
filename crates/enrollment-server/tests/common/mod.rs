//! Shared fixtures for the enrollment server tests
//!
//! Certificates and signed envelopes are minted at test time, so no key
//! material is checked into the tree.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

#![allow(dead_code)]

use enrollment_server::{
    crypto::{AnchorClassifier, CertificateAuthority, Pkcs7Backend},
    eligibility::EligibilityGate,
    envelope::EnvelopeVerifier,
    phase::PhaseDisambiguator,
    profile::StaticProfileService,
    server::EnrollmentState,
};
use openssl::{
    asn1::Asn1Time,
    bn::{BigNum, MsbOption},
    hash::MessageDigest,
    pkcs7::{Pkcs7, Pkcs7Flags},
    pkey::{PKey, Private},
    rsa::Rsa,
    stack::Stack,
    symm::Cipher,
    x509::{
        extension::{BasicConstraints, KeyUsage},
        X509Builder, X509NameBuilder, X509,
    },
};
use std::sync::Arc;

pub const ENROLL_PROFILE: &[u8] = b"enroll-profile";
pub const OTA_PROFILE: &[u8] = b"ota-profile";
pub const OTA_PHASE2_PROFILE: &[u8] = b"ota-phase2-profile";
pub const OTA_PHASE3_PROFILE: &[u8] = b"ota-phase3-profile";

pub fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A certificate and its private key.
pub struct Identity {
    pub certificate: X509,
    pub key: PKey<Private>,
}

impl Identity {
    pub fn certificate_authority(common_name: &str) -> Self {
        mint(common_name, None)
    }

    pub fn issued_by(common_name: &str, issuer: &Identity) -> Self {
        mint(common_name, Some(issuer))
    }

    pub fn pem(&self) -> Vec<u8> {
        self.certificate.to_pem().unwrap()
    }

    /// Wrap `content` in an attached PKCS#7 signed-data envelope signed by
    /// this identity.
    pub fn sign(&self, content: &[u8]) -> Vec<u8> {
        self.sign_with(content, Pkcs7Flags::BINARY)
    }

    /// Like `sign`, but the signer certificate is left out of the envelope,
    /// so no signer can be resolved from it.
    pub fn sign_without_certificate(&self, content: &[u8]) -> Vec<u8> {
        self.sign_with(content, Pkcs7Flags::BINARY | Pkcs7Flags::NOCERTS)
    }

    fn sign_with(&self, content: &[u8], flags: Pkcs7Flags) -> Vec<u8> {
        let certs = Stack::<X509>::new().unwrap();
        Pkcs7::sign(&self.certificate, &self.key, &certs, content, flags)
            .unwrap()
            .to_der()
            .unwrap()
    }

    /// A well-formed PKCS#7 enveloped-data value (not signed-data) addressed
    /// to this identity.
    pub fn encrypt(&self, content: &[u8]) -> Vec<u8> {
        let mut recipients = Stack::<X509>::new().unwrap();
        recipients.push(self.certificate.clone()).unwrap();
        Pkcs7::encrypt(&recipients, content, Cipher::aes_128_cbc(), Pkcs7Flags::BINARY)
            .unwrap()
            .to_der()
            .unwrap()
    }
}

fn mint(common_name: &str, issuer: Option<&Identity>) -> Identity {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some(issuer) => builder
            .set_issuer_name(issuer.certificate.subject_name())
            .unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();

    match issuer {
        None => {
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .key_cert_sign()
                        .crl_sign()
                        .build()
                        .unwrap(),
                )
                .unwrap();
            builder.sign(&key, MessageDigest::sha256()).unwrap();
        }
        Some(issuer) => {
            builder
                .append_extension(BasicConstraints::new().build().unwrap())
                .unwrap();
            builder
                .append_extension(KeyUsage::new().digital_signature().build().unwrap())
                .unwrap();
            builder.sign(&issuer.key, MessageDigest::sha256()).unwrap();
        }
    }

    Identity {
        certificate: builder.build(),
        key,
    }
}

/// The cast of a test run: two trust anchors, a device identity under
/// each, and a device nobody vouches for.
pub struct Fixture {
    pub device_ca: Identity,
    pub enrollment_ca: Identity,
    /// Device identity issued by the (stand-in) Apple Device CA.
    pub device: Identity,
    /// Device identity issued by our own enrollment CA in OTA phase 2.
    pub enrolled: Identity,
    pub stranger: Identity,
}

impl Fixture {
    pub fn new() -> Self {
        let device_ca = Identity::certificate_authority("Test Apple iPhone Device CA");
        let enrollment_ca = Identity::certificate_authority("Test Enrollment CA");
        let device = Identity::issued_by("device-0001", &device_ca);
        let enrolled = Identity::issued_by("device-0001 enrolled", &enrollment_ca);
        let stranger = Identity::certificate_authority("Stranger");
        Fixture {
            device_ca,
            enrollment_ca,
            device,
            enrolled,
            stranger,
        }
    }

    pub fn classifier(&self) -> AnchorClassifier {
        let device_authority =
            CertificateAuthority::from_certificates(vec![self.device_ca.certificate.clone()])
                .unwrap();
        let enrollment_authority =
            CertificateAuthority::from_certificates(vec![self.enrollment_ca.certificate.clone()])
                .unwrap();
        AnchorClassifier::new(device_authority, Some(enrollment_authority))
    }

    /// Server state backed by the real OpenSSL collaborators and in-memory
    /// profiles.
    pub fn state(&self, minimum_build_version: Option<&str>) -> EnrollmentState {
        let disambiguator = PhaseDisambiguator::new(
            EnvelopeVerifier::new(Arc::new(Pkcs7Backend::new())),
            Arc::new(self.classifier()),
        );
        let gate = minimum_build_version.map(|minimum| EligibilityGate::new(minimum).unwrap());
        let profiles = StaticProfileService::new(ENROLL_PROFILE.to_vec()).with_ota_profiles(
            Some(OTA_PROFILE.to_vec()),
            Some(OTA_PHASE2_PROFILE.to_vec()),
            Some(OTA_PHASE3_PROFILE.to_vec()),
        );
        EnrollmentState::new(disambiguator, gate, Arc::new(profiles))
    }
}

fn plist_document(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
"#,
    );
    for (key, value) in entries {
        body.push_str(&format!("<key>{}</key><string>{}</string>\n", key, value));
    }
    body.push_str("</dict>\n</plist>\n");
    body.into_bytes()
}

/// The device information a DEP device POSTs to `/mdm/enroll`.
pub fn dep_plist(os_version: &str, build_version: &str) -> Vec<u8> {
    plist_document(&[
        ("LANGUAGE", "en-GB"),
        ("PRODUCT", "iPhone13,2"),
        ("SERIAL", "C02XXXXXXXXX"),
        ("UDID", "00008101-000000000000001E"),
        ("OS_VERSION", os_version),
        ("VERSION", build_version),
    ])
}

/// The device attributes returned in OTA phases 2 and 3.
pub fn ota_plist(challenge: &str) -> Vec<u8> {
    plist_document(&[
        ("CHALLENGE", challenge),
        ("PRODUCT", "iPhone13,2"),
        ("SERIAL", "C02XXXXXXXXX"),
        ("UDID", "00008101-000000000000001E"),
        ("VERSION", "20B101"),
    ])
}
