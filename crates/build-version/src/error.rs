//! Error types associated with build version parsing.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE_MIT.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use err_derive::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildVersionError {
    /// The string does not have the `<digits><char><digits><chars*>` shape.
    #[error(display = "BuildVersionError: invalid version format: {:?}.", _0)]
    InvalidVersionFormat(String),
    /// One side of a comparison failed to parse.
    #[error(
        display = "BuildVersionError: could not split {} operand {:?}: {}.",
        operand,
        version,
        cause
    )]
    OperandError {
        operand: &'static str,
        version: String,
        cause: Box<BuildVersionError>,
    },
}

impl BuildVersionError {
    /// True for every malformed-input failure, including those wrapped with
    /// comparison operand context.
    pub fn is_invalid_format(&self) -> bool {
        match self {
            BuildVersionError::InvalidVersionFormat(_) => true,
            BuildVersionError::OperandError { cause, .. } => cause.is_invalid_format(),
        }
    }
}
