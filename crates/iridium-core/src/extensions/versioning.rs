//! Extension version parsing and constraint checking.
//!
//! Thin wrappers around the semver crate, shared by manifest validation,
//! registry engine-compatibility checks, and loader dependency checks.

use semver::{Version, VersionReq};
use thiserror::Error;

/// Versioning errors.
#[derive(Debug, Error)]
pub enum VersioningError {
    /// Invalid version format.
    #[error("invalid version format: {0}")]
    InvalidVersion(String),

    /// Invalid version requirement.
    #[error("invalid version requirement: {0}")]
    InvalidRequirement(String),
}

/// Result type for versioning operations.
pub type Result<T> = std::result::Result<T, VersioningError>;

/// Parses a version string into a semver Version.
pub fn parse_version(version: &str) -> Result<Version> {
    Version::parse(version)
        .map_err(|e| VersioningError::InvalidVersion(format!("{}: {}", version, e)))
}

/// Parses a version requirement string (e.g. "^1.2.0", ">=1.0.0").
pub fn parse_requirement(requirement: &str) -> Result<VersionReq> {
    VersionReq::parse(requirement)
        .map_err(|e| VersioningError::InvalidRequirement(format!("{}: {}", requirement, e)))
}

/// Checks whether a version satisfies a requirement.
pub fn satisfies(version: &str, requirement: &str) -> Result<bool> {
    let version = parse_version(version)?;
    let requirement = parse_requirement(requirement)?;
    Ok(requirement.matches(&version))
}
