//! Ruleset compatibility checks against the library version.
//!
//! A ruleset may declare `requires = ">=0.1.0, <0.3.0"` in its `[meta]`
//! table; loading fails when the running library does not satisfy it.

use semver::{Version, VersionReq};
use std::fmt;

/// Version of this library, as rulesets see it.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    InvalidVersion { value: String, source: String },
    InvalidRequirement { value: String, source: String },
    /// The requirement parsed but the version does not satisfy it.
    Unsupported { requirement: String, version: String },
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
            VersionError::Unsupported {
                requirement,
                version,
            } => write!(
                f,
                "ruleset requires value-rules {} but this is {}",
                requirement, version
            ),
        }
    }
}

impl std::error::Error for VersionError {}

/// Whether `version` satisfies `requirement`. A missing or blank requirement
/// matches everything.
///
/// ```
/// use value_rules::config::version::matches_requirement;
///
/// assert!(matches_requirement("0.1.4", Some(">=0.1.0, <0.2.0")).unwrap());
/// assert!(!matches_requirement("0.2.0", Some("^0.1")).unwrap());
/// assert!(matches_requirement("0.2.0", None).unwrap());
/// ```
pub fn matches_requirement(version: &str, requirement: Option<&str>) -> Result<bool, VersionError> {
    let Some(requirement) = requirement.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(true);
    };

    let version = Version::parse(version).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        source: e.to_string(),
    })?;
    let req = VersionReq::parse(requirement).map_err(|e| VersionError::InvalidRequirement {
        value: requirement.to_string(),
        source: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

/// Fail unless [`LIBRARY_VERSION`] satisfies `requirement`.
pub fn check_library_version(requirement: Option<&str>) -> Result<(), VersionError> {
    if matches_requirement(LIBRARY_VERSION, requirement)? {
        Ok(())
    } else {
        Err(VersionError::Unsupported {
            requirement: requirement.unwrap_or_default().trim().to_string(),
            version: LIBRARY_VERSION.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_requirement_matches() {
        assert!(matches_requirement("0.1.0", None).unwrap());
        assert!(matches_requirement("0.1.0", Some("  ")).unwrap());
    }

    #[test]
    fn test_ranges() {
        let req = ">=0.1.0, <0.3.0";
        assert!(matches_requirement("0.1.0", Some(req)).unwrap());
        assert!(matches_requirement("0.2.7", Some(req)).unwrap());
        assert!(!matches_requirement("0.3.0", Some(req)).unwrap());
        assert!(!matches_requirement("0.0.9", Some(req)).unwrap());
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            matches_requirement("one", Some(">=0.1.0")),
            Err(VersionError::InvalidVersion { .. })
        ));
        assert!(matches!(
            matches_requirement("0.1.0", Some(">=soon")),
            Err(VersionError::InvalidRequirement { .. })
        ));
    }

    #[test]
    fn test_library_version() {
        assert!(check_library_version(Some(&format!("={LIBRARY_VERSION}"))).is_ok());
        let err = check_library_version(Some(">=999.0.0")).unwrap_err();
        assert!(matches!(err, VersionError::Unsupported { .. }));
        assert!(err.to_string().contains(">=999.0.0"));
    }
}
