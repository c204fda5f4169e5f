//! Version gating for registry entries.
//!
//! A provider entry may carry a `requires` range like ">=0.2, <1.0". Entries
//! whose range the running installer does not satisfy are hidden from the
//! prompt and listed as unavailable by `yui providers`, so a registry file
//! written for a newer installer degrades cleanly instead of half-working.

use semver::{Version, VersionReq};
use std::fmt;

#[derive(Debug, Clone)]
pub enum VersionError {
    InvalidVersion { value: String, source: String },
    InvalidRequirement { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
            VersionError::InvalidRequirement { value, source } => {
                write!(f, "invalid version requirement '{}': {}", value, source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Check if a version satisfies a requirement string.
///
/// # Examples
///
/// ```
/// use yui_installer::registry::version::matches_requirement;
///
/// assert!(matches_requirement("0.2.0", Some(">=0.2")).unwrap());
/// assert!(!matches_requirement("0.1.4", Some(">=0.2")).unwrap());
///
/// // No requirement means the entry works everywhere
/// assert!(matches_requirement("0.1.0", None).unwrap());
/// ```
pub fn matches_requirement(
    version: &str,
    requirement: Option<&str>,
) -> Result<bool, VersionError> {
    let Some(req_str) = requirement else {
        return Ok(true);
    };

    let req_str = req_str.trim();
    if req_str.is_empty() {
        return Ok(true);
    }

    let version = Version::parse(version).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        source: e.to_string(),
    })?;

    let req = VersionReq::parse(req_str).map_err(|e| VersionError::InvalidRequirement {
        value: req_str.to_string(),
        source: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

/// Gate a requirement against the version of this installer build.
pub fn installer_supports(requirement: Option<&str>) -> Result<bool, VersionError> {
    matches_requirement(env!("CARGO_PKG_VERSION"), requirement)
}
