//! Apple OS build versions
//!
//! Build identifiers such as `23A5286i` are split into four components,
//! `23`, `A`, `5286` and `i`, and ordered lexicographically on those
//! components: major (numeric), minor (a single character), build (numeric)
//! and finally the patch suffix (plain string ordering, where a missing
//! suffix sorts before any present one).
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE_MIT.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

pub mod error;
pub use crate::error::BuildVersionError;

use lazy_static::lazy_static;
use regex::Regex;
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

lazy_static! {
    // ASCII classes only: `\d` and `\w` are Unicode-aware in `regex`.
    static ref BUILD_VERSION_REGEX: Regex =
        Regex::new(r"^([0-9]+)([0-9A-Za-z_])([0-9]+)([0-9A-Za-z_]*)$")
            .expect("build version regex is valid");
}

/// A parsed build version.
///
/// Equality, hashing and ordering only look at the four components, so
/// `012A34` and `12A34` compare equal.  `Display` reproduces the string the
/// version was parsed from.
#[derive(Clone, Debug)]
pub struct BuildVersion {
    major: u64,
    minor: char,
    build: u64,
    patch: String,
    raw: String,
}

impl BuildVersion {
    /// Split `s` into its components, failing with
    /// `BuildVersionError::InvalidVersionFormat` if it does not match the
    /// build version grammar.  No trimming or case folding is performed.
    pub fn parse(s: &str) -> Result<Self, BuildVersionError> {
        let invalid = || BuildVersionError::InvalidVersionFormat(s.to_string());

        let captures = BUILD_VERSION_REGEX.captures(s).ok_or_else(invalid)?;

        let major = captures[1].parse::<u64>().map_err(|_| invalid())?;
        let minor = captures[2].chars().next().ok_or_else(invalid)?;
        let build = captures[3].parse::<u64>().map_err(|_| invalid())?;
        let patch = captures[4].to_string();

        Ok(BuildVersion {
            major,
            minor,
            build,
            patch,
            raw: s.to_string(),
        })
    }

    #[inline]
    pub fn major(&self) -> u64 {
        self.major
    }

    #[inline]
    pub fn minor(&self) -> char {
        self.minor
    }

    #[inline]
    pub fn build(&self) -> u64 {
        self.build
    }

    /// The alphabetic suffix, empty for unpatched builds.
    #[inline]
    pub fn patch(&self) -> &str {
        &self.patch
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn less_than(&self, other: &BuildVersion) -> bool {
        self < other
    }

    fn components(&self) -> (u64, char, u64, &str) {
        (self.major, self.minor, self.build, &self.patch)
    }
}

/// Parse both operands and return whether `mine` is strictly older than
/// `theirs`.  Parse failures name the offending operand.
pub fn less_than(mine: &str, theirs: &str) -> Result<bool, BuildVersionError> {
    let mine = parse_operand("left", mine)?;
    let theirs = parse_operand("right", theirs)?;
    Ok(mine.less_than(&theirs))
}

fn parse_operand(operand: &'static str, version: &str) -> Result<BuildVersion, BuildVersionError> {
    BuildVersion::parse(version).map_err(|err| BuildVersionError::OperandError {
        operand,
        version: version.to_string(),
        cause: Box::new(err),
    })
}

impl FromStr for BuildVersion {
    type Err = BuildVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildVersion::parse(s)
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for BuildVersion {
    fn eq(&self, other: &Self) -> bool {
        self.components() == other.components()
    }
}

impl Eq for BuildVersion {}

impl Hash for BuildVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components().hash(state)
    }
}

impl PartialOrd for BuildVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BuildVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.build.cmp(&other.build))
            .then_with(|| self.patch.cmp(&other.patch))
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    fn arb_build_version() -> impl Strategy<Value = BuildVersion> {
        "[0-9]{1,3}[A-Z][0-9]{1,5}[a-z]{0,2}".prop_map(|s| BuildVersion::parse(&s).unwrap())
    }

    proptest! {
        #[test]
        fn trichotomy(a in arb_build_version(), b in arb_build_version()) {
            let outcomes = [a.less_than(&b), b.less_than(&a), a == b];
            prop_assert_eq!(outcomes.iter().filter(|x| **x).count(), 1);
        }

        #[test]
        fn transitivity(
            a in arb_build_version(),
            b in arb_build_version(),
            c in arb_build_version(),
        ) {
            if a.less_than(&b) && b.less_than(&c) {
                prop_assert!(a.less_than(&c));
            }
        }

        #[test]
        fn irreflexivity(a in arb_build_version()) {
            prop_assert!(!a.less_than(&a));
        }

        #[test]
        fn major_dominates(
            lo in 0u64..500,
            delta in 1u64..500,
            lhs in "[A-Z][0-9]{1,5}[a-z]{0,2}",
            rhs in "[A-Z][0-9]{1,5}[a-z]{0,2}",
        ) {
            let older = format!("{}{}", lo, lhs);
            let newer = format!("{}{}", lo + delta, rhs);
            prop_assert!(less_than(&older, &newer).unwrap());
            prop_assert!(!less_than(&newer, &older).unwrap());
        }

        #[test]
        fn build_dominates_patch_once_minor_equal(
            build in 0u64..10_000,
            delta in 1u64..10_000,
            lhs in "[a-z]{0,3}",
            rhs in "[a-z]{0,3}",
        ) {
            let older = format!("21C{}{}", build, lhs);
            let newer = format!("21C{}{}", build + delta, rhs);
            prop_assert!(less_than(&older, &newer).unwrap());
        }

        #[test]
        fn empty_patch_sorts_first(prefix in "[0-9]{1,3}[A-Z][0-9]{1,5}", patch in "[a-z]{1,3}") {
            let patched = format!("{}{}", prefix, patch);
            prop_assert!(less_than(&prefix, &patched).unwrap());
            prop_assert!(!less_than(&patched, &prefix).unwrap());
        }

        #[test]
        fn round_trip(s in "[0-9]{1,4}[0-9A-Za-z_][0-9]{1,6}[0-9A-Za-z_]{0,3}") {
            let version = BuildVersion::parse(&s).unwrap();
            prop_assert_eq!(version.to_string(), s.clone());
            let rebuilt = BuildVersion::parse(&format!(
                "{}{}{}{}",
                version.major(),
                version.minor(),
                version.build(),
                version.patch()
            ))
            .unwrap();
            prop_assert_eq!(rebuilt, version);
        }
    }
}
