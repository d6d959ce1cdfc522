//! Error messages for the enrollment server
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::{eligibility::OSTooOldError, response};
use actix_web::{error, http::StatusCode, HttpResponse};
use build_version::BuildVersionError;
use err_derive::Error;

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error(display = "EnrollmentServer: malformed signed envelope: {}.", _0)]
    MalformedEnvelope(String),
    #[error(display = "EnrollmentServer: invalid envelope signature: {}.", _0)]
    InvalidSignature(String),
    #[error(
        display = "EnrollmentServer: invalid CMS signer during enrollment: expected exactly one signer, found {}.",
        _0
    )]
    InvalidSigner(usize),
    #[error(display = "EnrollmentServer: unauthorized enrollment client: {}.", _0)]
    UntrustedSigner(&'static str),
    #[error(display = "EnrollmentServer: unknown enrollment method {}.", _0)]
    UnsupportedMethod(String),
    #[error(display = "EnrollmentServer: malformed enrollment payload: {}.", _0)]
    MalformedPayload(String),
    #[error(display = "EnrollmentServer: {}.", _0)]
    InvalidVersionFormat(#[error(source)] BuildVersionError),
    #[error(display = "EnrollmentServer: {}.", _0)]
    OSTooOld(OSTooOldError),
    #[error(display = "EnrollmentServer: IOError: {:?}.", _0)]
    IOError(#[error(source)] std::io::Error),
    #[error(display = "EnrollmentServer: OpenSSLError (an error stack): {:#?}.", _0)]
    OpenSSLError(#[error(source)] openssl::error::ErrorStack),
    #[error(display = "EnrollmentServer: SerdeJsonError: {:?}.", _0)]
    SerdeJsonError(#[error(source)] serde_json::Error),
    #[error(display = "EnrollmentServer: configuration error: {}.", _0)]
    ConfigError(String),
    #[error(display = "EnrollmentServer: profile error: {}.", _0)]
    ProfileError(String),
}

/// The coarse classification used to pick a wire encoding for an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedEnvelope,
    InvalidSignature,
    InvalidSigner,
    UntrustedSigner,
    UnsupportedMethod,
    MalformedPayload,
    InvalidVersionFormat,
    OSTooOld,
    Internal,
}

impl EnrollmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnrollmentError::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            EnrollmentError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            EnrollmentError::InvalidSigner(_) => ErrorKind::InvalidSigner,
            EnrollmentError::UntrustedSigner(_) => ErrorKind::UntrustedSigner,
            EnrollmentError::UnsupportedMethod(_) => ErrorKind::UnsupportedMethod,
            EnrollmentError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            EnrollmentError::InvalidVersionFormat(_) => ErrorKind::InvalidVersionFormat,
            EnrollmentError::OSTooOld(_) => ErrorKind::OSTooOld,
            EnrollmentError::IOError(_)
            | EnrollmentError::OpenSSLError(_)
            | EnrollmentError::SerdeJsonError(_)
            | EnrollmentError::ConfigError(_)
            | EnrollmentError::ProfileError(_) => ErrorKind::Internal,
        }
    }
}

impl error::ResponseError for EnrollmentError {
    fn error_response(&self) -> HttpResponse {
        response::encode(response::Outcome::Failure(self)).into_http_response()
    }
    fn status_code(&self) -> StatusCode {
        response::error_encoding(self.kind()).0
    }
}
