//! The device enrollment server
//!
//! Authenticates and decodes enrollment requests from Apple devices (DEP and
//! over-the-air), gates them on OS build, and answers with configuration
//! profiles.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE_MIT.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

pub mod config;
pub mod crypto;
pub mod decoder;
pub mod eligibility;
pub mod envelope;
pub mod error;
pub mod phase;
pub mod profile;
pub mod response;
pub mod server;

pub use crate::error::{EnrollmentError, ErrorKind};
