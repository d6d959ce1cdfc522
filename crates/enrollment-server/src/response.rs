//! Wire encoding of enrollment outcomes
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::error::{EnrollmentError, ErrorKind};
use actix_web::{http::header, http::StatusCode, HttpResponse};
use log::error;
use serde_json::json;

/// Content type of (signed) configuration profiles.
pub const MOBILECONFIG_CONTENT_TYPE: &str = "application/x-apple-aspen-config";
/// Content type of the structured OS-too-old rejection.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type of generic error bodies.
pub const JSON_UTF8_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// The only message a generic failure ever exposes.
pub const GENERIC_ERROR_MESSAGE: &str = "enrollment request could not be processed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorEncoder {
    /// Serialize the rejection value itself.
    Structured,
    /// `{"error": GENERIC_ERROR_MESSAGE}`.
    Generic,
}

/// Error kinds with a bespoke wire representation.  Everything not listed
/// falls back to `DEFAULT_ERROR_ENCODING`.
const ERROR_ENCODINGS: &[(ErrorKind, StatusCode, ErrorEncoder)] =
    &[(ErrorKind::OSTooOld, StatusCode::FORBIDDEN, ErrorEncoder::Structured)];

const DEFAULT_ERROR_ENCODING: (StatusCode, ErrorEncoder) =
    (StatusCode::INTERNAL_SERVER_ERROR, ErrorEncoder::Generic);

pub fn error_encoding(kind: ErrorKind) -> (StatusCode, ErrorEncoder) {
    ERROR_ENCODINGS
        .iter()
        .find(|(mapped, _, _)| *mapped == kind)
        .map(|(_, status, encoder)| (*status, *encoder))
        .unwrap_or(DEFAULT_ERROR_ENCODING)
}

#[derive(Debug)]
pub enum Outcome<'a> {
    /// Raw profile bytes, passed through untouched.
    Profile(&'a [u8]),
    Failure(&'a EnrollmentError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl EncodedResponse {
    pub fn into_http_response(self) -> HttpResponse {
        HttpResponse::build(self.status)
            .insert_header((header::CONTENT_TYPE, self.content_type))
            .body(self.body)
    }
}

pub fn encode(outcome: Outcome<'_>) -> EncodedResponse {
    match outcome {
        Outcome::Profile(profile) => EncodedResponse {
            status: StatusCode::OK,
            content_type: MOBILECONFIG_CONTENT_TYPE,
            body: profile.to_vec(),
        },
        Outcome::Failure(err) => encode_error(err),
    }
}

fn encode_error(err: &EnrollmentError) -> EncodedResponse {
    let (status, encoder) = error_encoding(err.kind());
    if let (ErrorEncoder::Structured, EnrollmentError::OSTooOld(rejection)) = (encoder, err) {
        match serde_json::to_vec(rejection) {
            Ok(body) => {
                return EncodedResponse {
                    status,
                    content_type: JSON_CONTENT_TYPE,
                    body,
                }
            }
            Err(json_err) => {
                error!(
                    "enrollment-server::response::encode failed to serialize rejection:{}",
                    json_err
                );
            }
        }
    }
    EncodedResponse {
        status: DEFAULT_ERROR_ENCODING.0,
        content_type: JSON_UTF8_CONTENT_TYPE,
        body: generic_body(),
    }
}

fn generic_body() -> Vec<u8> {
    json!({ "error": GENERIC_ERROR_MESSAGE }).to_string().into_bytes()
}
