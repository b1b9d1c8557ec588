//! Extension manifest format and validation.
//!
//! Defines the structure and validation for extension manifest files
//! (iridium-extension.json).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::extensions::versioning;

/// Manifest file name.
pub const MANIFEST_FILE: &str = "iridium-extension.json";

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum number of keywords.
pub const MAX_KEYWORDS: usize = 10;

/// Extension id pattern: lowercase kebab-case, starts with a letter,
/// total length at least three.
static EXTENSION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]{2,}$").expect("extension id regex"));

/// Extension manifest errors.
#[derive(Debug, Error)]
pub enum ExtensionManifestError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Manifest file not found.
    #[error("manifest file not found: {0}")]
    NotFound(String),

    /// Missing required field.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Invalid extension id.
    #[error("invalid extension id: '{0}' (lowercase kebab-case, min 3 chars, starts with a letter)")]
    InvalidId(String),

    /// Invalid version format.
    #[error("invalid version format: '{0}' (strict semver major.minor.patch)")]
    InvalidVersion(String),

    /// Description exceeds the length limit.
    #[error("description too long: {0} chars (max {MAX_DESCRIPTION_LEN})")]
    DescriptionTooLong(usize),

    /// Too many keywords.
    #[error("too many keywords: {0} (max {MAX_KEYWORDS})")]
    TooManyKeywords(usize),

    /// Invalid keyword entry.
    #[error("invalid keyword: {0}")]
    InvalidKeyword(String),

    /// Invalid author field.
    #[error("invalid author: {0}")]
    InvalidAuthor(String),

    /// Invalid dependency declaration.
    #[error("invalid dependency: {0}")]
    InvalidDependency(String),

    /// Duplicate permission tag.
    #[error("duplicate permission: {0}")]
    DuplicatePermission(String),

    /// Invalid engine requirement.
    #[error("invalid engine requirement for '{0}': {1}")]
    InvalidEngine(String, String),

    /// Invalid conflicts declaration.
    #[error("invalid conflict entry: {0}")]
    InvalidConflict(String),
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, ExtensionManifestError>;

/// Checks if a string is a valid extension id.
///
/// Valid ids are lowercase kebab-case: a lowercase letter followed by at
/// least two lowercase letters, digits, or hyphens.
pub fn is_valid_extension_id(id: &str) -> bool {
    EXTENSION_ID_RE.is_match(id)
}

/// Checks if a string is a strict semantic version.
///
/// Exactly three numeric components, with optional `-prerelease` and/or
/// `+build` suffixes. A leading `v` is rejected.
pub fn is_valid_version(version: &str) -> bool {
    semver::Version::parse(version).is_ok()
}

/// Extension category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionCategory {
    /// Contributes workflow nodes.
    WorkflowNode,
    /// Contributes dashboard widgets.
    Widget,
    /// Integrates an external service.
    Integration,
    /// General-purpose utility.
    Utility,
    /// Visual theme.
    Theme,
    /// Language pack.
    LanguagePack,
}

/// Capability tag an extension may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionPermission {
    /// Outbound network access.
    Network,
    /// Read access to the workspace filesystem.
    FilesystemRead,
    /// Write access to the workspace filesystem.
    FilesystemWrite,
    /// Persistent key-value storage.
    Storage,
    /// Clipboard access.
    Clipboard,
    /// User-facing notifications.
    Notifications,
}

/// Extension author: either a plain name or a structured record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionAuthor {
    /// Plain author name.
    Name(String),
    /// Structured author record.
    Detailed {
        /// Author name.
        name: String,
        /// Contact email.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        /// Homepage URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl ExtensionAuthor {
    /// Gets the author display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }
}

/// A declared dependency on another extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDependency {
    /// Extension id of the dependency.
    pub id: String,

    /// Version requirement (e.g. "^1.2.0").
    pub version: String,

    /// Whether the dependency is optional. Optional dependencies are not
    /// activated automatically and may be absent from the registry.
    #[serde(default)]
    pub optional: bool,
}

/// A workflow node contributed by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContribution {
    /// Node type id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Palette category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A dashboard widget contributed by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetContribution {
    /// Widget id.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// A command contributed by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContribution {
    /// Command id.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// A settings entry contributed by an extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingContribution {
    /// Setting key.
    pub key: String,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Structured contribution points declared by an extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionContributions {
    /// Workflow nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeContribution>,

    /// Dashboard widgets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<WidgetContribution>,

    /// Commands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandContribution>,

    /// Settings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SettingContribution>,
}

/// Extension manifest structure.
///
/// Immutable once registered; the registry stores it verbatim alongside the
/// mutable lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionManifest {
    /// Extension id (unique, kebab-case).
    pub id: String,

    /// Human-readable extension name.
    pub name: String,

    /// Extension version (strict semver).
    pub version: String,

    /// Extension description.
    pub description: String,

    /// Extension author.
    pub author: ExtensionAuthor,

    /// Extension category.
    pub category: ExtensionCategory,

    /// Search keywords.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Entry reference handed to the module resolver.
    pub main: String,

    /// Dependencies on other extensions, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<ExtensionDependency>,

    /// Requested capability tags.
    #[serde(default)]
    pub permissions: Vec<ExtensionPermission>,

    /// Activation triggers fired by the host. Opaque to this subsystem.
    #[serde(default)]
    pub activation_events: Vec<String>,

    /// Minimum host-engine compatibility (engine name -> version requirement).
    #[serde(default)]
    pub engines: HashMap<String, String>,

    /// Structured contribution points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributes: Option<ExtensionContributions>,

    /// Extension ids this extension cannot coexist with.
    #[serde(default)]
    pub conflicts: Vec<String>,
}

/// Result of a non-throwing manifest check.
///
/// `manifest` is present only when parsing and every validation rule passed;
/// `errors` collects all violations found in one pass.
#[derive(Debug)]
pub struct ManifestCheck {
    /// The validated manifest, if valid.
    pub manifest: Option<ExtensionManifest>,
    /// All violations found.
    pub errors: Vec<String>,
}

impl ManifestCheck {
    /// True when the manifest parsed and validated cleanly.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl ExtensionManifest {
    /// Loads an extension manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExtensionManifestError::NotFound(path.to_string_lossy().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses and validates a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: ExtensionManifest = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parses and validates a manifest without failing on the first
    /// violation, collecting every problem found.
    pub fn check(json: &str) -> ManifestCheck {
        let manifest: ExtensionManifest = match serde_json::from_str(json) {
            Ok(m) => m,
            Err(e) => {
                return ManifestCheck {
                    manifest: None,
                    errors: vec![format!("JSON parse error: {e}")],
                };
            }
        };

        let violations = manifest.collect_violations();
        if violations.is_empty() {
            ManifestCheck { manifest: Some(manifest), errors: Vec::new() }
        } else {
            ManifestCheck {
                manifest: None,
                errors: violations.iter().map(ToString::to_string).collect(),
            }
        }
    }

    /// Validates the manifest structure and content.
    ///
    /// Returns the first violation found; use [`ExtensionManifest::check`]
    /// to collect all of them.
    pub fn validate(&self) -> Result<()> {
        match self.collect_violations().into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Collects every validation violation in declaration order.
    fn collect_violations(&self) -> Vec<ExtensionManifestError> {
        let mut violations = Vec::new();

        if self.id.is_empty() {
            violations.push(ExtensionManifestError::MissingField("id".to_string()));
        } else if !is_valid_extension_id(&self.id) {
            violations.push(ExtensionManifestError::InvalidId(self.id.clone()));
        }

        if self.name.is_empty() {
            violations.push(ExtensionManifestError::MissingField("name".to_string()));
        }

        if self.version.is_empty() {
            violations.push(ExtensionManifestError::MissingField("version".to_string()));
        } else if !is_valid_version(&self.version) {
            violations.push(ExtensionManifestError::InvalidVersion(self.version.clone()));
        }

        if self.description.is_empty() {
            violations.push(ExtensionManifestError::MissingField("description".to_string()));
        } else if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            violations.push(ExtensionManifestError::DescriptionTooLong(
                self.description.chars().count(),
            ));
        }

        self.collect_author_violations(&mut violations);

        if self.keywords.len() > MAX_KEYWORDS {
            violations.push(ExtensionManifestError::TooManyKeywords(self.keywords.len()));
        }
        for keyword in &self.keywords {
            if keyword.trim().is_empty() {
                violations
                    .push(ExtensionManifestError::InvalidKeyword("empty keyword".to_string()));
            }
        }

        if self.main.is_empty() {
            violations.push(ExtensionManifestError::MissingField("main".to_string()));
        }

        self.collect_dependency_violations(&mut violations);

        let mut seen_permissions = std::collections::HashSet::new();
        for permission in &self.permissions {
            if !seen_permissions.insert(*permission) {
                violations.push(ExtensionManifestError::DuplicatePermission(format!(
                    "{permission:?}"
                )));
            }
        }

        for (engine, requirement) in &self.engines {
            if versioning::parse_requirement(requirement).is_err() {
                violations.push(ExtensionManifestError::InvalidEngine(
                    engine.clone(),
                    requirement.clone(),
                ));
            }
        }

        let mut seen_conflicts = std::collections::HashSet::new();
        for conflict in &self.conflicts {
            if !is_valid_extension_id(conflict) {
                violations.push(ExtensionManifestError::InvalidConflict(format!(
                    "invalid id '{conflict}'"
                )));
            } else if conflict == &self.id {
                violations.push(ExtensionManifestError::InvalidConflict(format!(
                    "'{conflict}' conflicts with itself"
                )));
            } else if !seen_conflicts.insert(conflict.clone()) {
                violations.push(ExtensionManifestError::InvalidConflict(format!(
                    "duplicate entry '{conflict}'"
                )));
            }
        }

        violations
    }

    fn collect_author_violations(&self, violations: &mut Vec<ExtensionManifestError>) {
        match &self.author {
            ExtensionAuthor::Name(name) => {
                if name.trim().is_empty() {
                    violations
                        .push(ExtensionManifestError::InvalidAuthor("empty name".to_string()));
                }
            }
            ExtensionAuthor::Detailed { name, email, url } => {
                if name.trim().is_empty() {
                    violations
                        .push(ExtensionManifestError::InvalidAuthor("empty name".to_string()));
                }
                if let Some(email) = email {
                    if !is_plausible_email(email) {
                        violations.push(ExtensionManifestError::InvalidAuthor(format!(
                            "malformed email '{email}'"
                        )));
                    }
                }
                if let Some(url) = url {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        violations.push(ExtensionManifestError::InvalidAuthor(format!(
                            "malformed url '{url}'"
                        )));
                    }
                }
            }
        }
    }

    fn collect_dependency_violations(&self, violations: &mut Vec<ExtensionManifestError>) {
        let mut seen = std::collections::HashSet::new();
        for dependency in &self.dependencies {
            if !is_valid_extension_id(&dependency.id) {
                violations.push(ExtensionManifestError::InvalidDependency(format!(
                    "invalid id '{}'",
                    dependency.id
                )));
                continue;
            }
            if dependency.id == self.id {
                violations.push(ExtensionManifestError::InvalidDependency(format!(
                    "'{}' depends on itself",
                    self.id
                )));
            }
            if !seen.insert(dependency.id.clone()) {
                violations.push(ExtensionManifestError::InvalidDependency(format!(
                    "duplicate entry '{}'",
                    dependency.id
                )));
            }
            if versioning::parse_requirement(&dependency.version).is_err() {
                violations.push(ExtensionManifestError::InvalidDependency(format!(
                    "invalid version requirement '{}' for '{}'",
                    dependency.version, dependency.id
                )));
            }
        }
    }

    /// Ids of required (non-optional) dependencies, in declaration order.
    pub fn required_dependency_ids(&self) -> Vec<String> {
        self.dependencies.iter().filter(|d| !d.optional).map(|d| d.id.clone()).collect()
    }

    /// Ids of optional dependencies, in declaration order.
    pub fn optional_dependency_ids(&self) -> Vec<String> {
        self.dependencies.iter().filter(|d| d.optional).map(|d| d.id.clone()).collect()
    }
}

/// Minimal structural email check: one `@` with a dot somewhere after it.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn minimal_manifest_json(id: &str, version: &str) -> String {
        format!(
            r#"{{
                "id": "{id}",
                "name": "Test Extension",
                "version": "{version}",
                "description": "A test extension",
                "author": "Test Author",
                "category": "utility",
                "main": "index"
            }}"#
        )
    }

    fn minimal_manifest(id: &str) -> ExtensionManifest {
        ExtensionManifest::from_json(&minimal_manifest_json(id, "1.0.0")).unwrap()
    }

    #[test]
    fn test_valid_extension_ids() {
        for id in ["abc", "test-extension", "my-ext-2", "a1-", "node-widgets"] {
            assert!(is_valid_extension_id(id), "id '{}' should be valid", id);
        }
    }

    #[test]
    fn test_invalid_extension_ids() {
        for id in ["Test", "ab", "test_extension", "", "1abc", "-abc", "my ext", "a.b.c"] {
            assert!(!is_valid_extension_id(id), "id '{}' should be invalid", id);
        }
    }

    #[test]
    fn test_valid_versions() {
        for version in ["1.0.0", "1.2.3-alpha", "1.0.0-beta.1", "2.0.0+20230101", "1.0.0-rc.1+build.123"]
        {
            assert!(is_valid_version(version), "version '{}' should be valid", version);
        }
    }

    #[test]
    fn test_invalid_versions() {
        for version in ["1.0", "1", "v1.0.0", "1.0.0.0", "abc", ""] {
            assert!(!is_valid_version(version), "version '{}' should be invalid", version);
        }
    }

    #[test]
    fn test_from_json_valid() {
        let manifest = minimal_manifest("json-extension");
        assert_eq!(manifest.id, "json-extension");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.author.name(), "Test Author");
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_from_json_invalid_id() {
        let result = ExtensionManifest::from_json(&minimal_manifest_json("Bad_Id", "1.0.0"));
        assert!(matches!(result.unwrap_err(), ExtensionManifestError::InvalidId(_)));
    }

    #[test]
    fn test_from_json_invalid_version() {
        let result = ExtensionManifest::from_json(&minimal_manifest_json("test-ext", "1.0"));
        assert!(matches!(result.unwrap_err(), ExtensionManifestError::InvalidVersion(_)));
    }

    #[test]
    fn test_load_manifest_file() {
        let temp_dir = TempDir::new().unwrap();
        let manifest_path = temp_dir.path().join(MANIFEST_FILE);
        fs::write(&manifest_path, minimal_manifest_json("disk-extension", "2.1.0")).unwrap();

        let manifest = ExtensionManifest::load(&manifest_path).unwrap();
        assert_eq!(manifest.id, "disk-extension");
        assert_eq!(manifest.version, "2.1.0");
    }

    #[test]
    fn test_load_nonexistent_manifest() {
        let result = ExtensionManifest::load(Path::new("/nonexistent/iridium-extension.json"));
        assert!(matches!(result.unwrap_err(), ExtensionManifestError::NotFound(_)));
    }

    #[test]
    fn test_structured_author() {
        let json = r#"{
            "id": "authored-ext",
            "name": "Authored",
            "version": "1.0.0",
            "description": "Structured author",
            "author": {"name": "Jo Dev", "email": "jo@example.com", "url": "https://example.com"},
            "category": "integration",
            "main": "index"
        }"#;
        let manifest = ExtensionManifest::from_json(json).unwrap();
        assert_eq!(manifest.author.name(), "Jo Dev");
    }

    #[test]
    fn test_structured_author_bad_email() {
        let json = r#"{
            "id": "authored-ext",
            "name": "Authored",
            "version": "1.0.0",
            "description": "Structured author",
            "author": {"name": "Jo Dev", "email": "not-an-email"},
            "category": "integration",
            "main": "index"
        }"#;
        let result = ExtensionManifest::from_json(json);
        assert!(matches!(result.unwrap_err(), ExtensionManifestError::InvalidAuthor(_)));
    }

    #[test]
    fn test_description_too_long() {
        let mut manifest = minimal_manifest("test-ext");
        manifest.description = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ExtensionManifestError::DescriptionTooLong(_)
        ));
    }

    #[test]
    fn test_too_many_keywords() {
        let mut manifest = minimal_manifest("test-ext");
        manifest.keywords = (0..=MAX_KEYWORDS).map(|i| format!("kw{i}")).collect();
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ExtensionManifestError::TooManyKeywords(_)
        ));
    }

    #[test]
    fn test_dependency_validation() {
        let mut manifest = minimal_manifest("test-ext");
        manifest.dependencies.push(ExtensionDependency {
            id: "test-ext".to_string(),
            version: "^1.0.0".to_string(),
            optional: false,
        });
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ExtensionManifestError::InvalidDependency(_)
        ));
    }

    #[test]
    fn test_dependency_bad_requirement() {
        let mut manifest = minimal_manifest("test-ext");
        manifest.dependencies.push(ExtensionDependency {
            id: "other-ext".to_string(),
            version: "not a requirement".to_string(),
            optional: false,
        });
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ExtensionManifestError::InvalidDependency(_)
        ));
    }

    #[test]
    fn test_duplicate_permissions_rejected() {
        let json = r#"{
            "id": "perm-ext",
            "name": "Permissions",
            "version": "1.0.0",
            "description": "Dup perms",
            "author": "Author",
            "category": "utility",
            "main": "index",
            "permissions": ["network", "network"]
        }"#;
        let result = ExtensionManifest::from_json(json);
        assert!(matches!(result.unwrap_err(), ExtensionManifestError::DuplicatePermission(_)));
    }

    #[test]
    fn test_unknown_permission_rejected_at_parse() {
        let json = r#"{
            "id": "perm-ext",
            "name": "Permissions",
            "version": "1.0.0",
            "description": "Unknown perm",
            "author": "Author",
            "category": "utility",
            "main": "index",
            "permissions": ["telepathy"]
        }"#;
        let result = ExtensionManifest::from_json(json);
        assert!(matches!(result.unwrap_err(), ExtensionManifestError::JsonParse(_)));
    }

    #[test]
    fn test_invalid_engine_requirement() {
        let mut manifest = minimal_manifest("test-ext");
        manifest.engines.insert("iridium".to_string(), "???".to_string());
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ExtensionManifestError::InvalidEngine(_, _)
        ));
    }

    #[test]
    fn test_check_collects_all_violations() {
        let json = r#"{
            "id": "Bad Id",
            "name": "",
            "version": "1.0",
            "description": "ok",
            "author": "Author",
            "category": "utility",
            "main": ""
        }"#;
        let check = ExtensionManifest::check(json);
        assert!(!check.is_valid());
        assert!(check.manifest.is_none());
        assert!(check.errors.len() >= 4, "expected several errors, got {:?}", check.errors);
    }

    #[test]
    fn test_check_valid_manifest() {
        let check = ExtensionManifest::check(&minimal_manifest_json("good-ext", "1.0.0"));
        assert!(check.is_valid());
        assert_eq!(check.manifest.unwrap().id, "good-ext");
    }

    #[test]
    fn test_check_parse_error() {
        let check = ExtensionManifest::check("{not json");
        assert!(!check.is_valid());
        assert_eq!(check.errors.len(), 1);
    }

    #[test]
    fn test_contributions_roundtrip() {
        let json = r#"{
            "id": "contrib-ext",
            "name": "Contributions",
            "version": "1.0.0",
            "description": "With contribution points",
            "author": "Author",
            "category": "workflow-node",
            "main": "index",
            "activationEvents": ["onStartup"],
            "contributes": {
                "nodes": [{"id": "http-request", "title": "HTTP Request", "category": "network"}],
                "commands": [{"id": "contrib-ext.run", "title": "Run"}],
                "settings": [{"key": "contrib-ext.timeout", "default": 30}]
            }
        }"#;
        let manifest = ExtensionManifest::from_json(json).unwrap();
        let contributes = manifest.contributes.as_ref().unwrap();
        assert_eq!(contributes.nodes.len(), 1);
        assert_eq!(contributes.commands.len(), 1);
        assert_eq!(manifest.activation_events, vec!["onStartup"]);

        let serialized = serde_json::to_string(&manifest).unwrap();
        let reparsed = ExtensionManifest::from_json(&serialized).unwrap();
        assert_eq!(manifest, reparsed);
    }

    #[test]
    fn test_required_and_optional_dependency_ids() {
        let mut manifest = minimal_manifest("test-ext");
        manifest.dependencies = vec![
            ExtensionDependency {
                id: "required-dep".to_string(),
                version: "^1.0.0".to_string(),
                optional: false,
            },
            ExtensionDependency {
                id: "optional-dep".to_string(),
                version: "^2.0.0".to_string(),
                optional: true,
            },
        ];
        assert_eq!(manifest.required_dependency_ids(), vec!["required-dep"]);
        assert_eq!(manifest.optional_dependency_ids(), vec!["optional-dep"]);
    }
}
