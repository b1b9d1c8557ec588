//! Extension registry: the source of truth for installed extensions.
//!
//! Holds each extension's manifest, lifecycle state, install location, and
//! last error, and answers the dependency-graph queries the loader needs.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use crate::extensions::dependency_graph::{DependencyGraph, DependencyGraphError};
use crate::extensions::manifest::{ExtensionManifest, ExtensionManifestError};
use crate::extensions::versioning;

/// Engine name extensions use in `engines` to constrain the host version.
pub const HOST_ENGINE: &str = "iridium";

/// Extension lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionState {
    /// Not registered with the host.
    Uninstalled,
    /// Registered; module may or may not be loaded.
    Installed,
    /// Activated and running.
    Enabled,
    /// Deactivated after having been enabled.
    Disabled,
    /// A load, activation, or deactivation failed.
    Error,
}

impl Default for ExtensionState {
    fn default() -> Self {
        Self::Uninstalled
    }
}

impl std::fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Uninstalled => "uninstalled",
            Self::Installed => "installed",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Registered extension: manifest plus mutable lifecycle metadata.
///
/// The runtime module handle is owned by the loader's cache, not stored
/// here, so metadata stays cheaply cloneable and serializable for host UIs.
#[derive(Debug, Clone)]
pub struct ExtensionMetadata {
    /// The validated manifest.
    pub manifest: ExtensionManifest,

    /// Current lifecycle state.
    pub state: ExtensionState,

    /// Installation directory path.
    pub install_path: PathBuf,

    /// Registration timestamp.
    pub installed_at: DateTime<Utc>,

    /// Failure reason; present only in the Error state.
    pub error: Option<String>,
}

/// Extension registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Extension not found.
    #[error("extension not found: {0}")]
    NotFound(String),

    /// Manifest validation failed.
    #[error("manifest error: {0}")]
    Manifest(#[from] ExtensionManifestError),

    /// The extension conflicts with an installed extension.
    #[error("extension conflict: {0}")]
    Conflict(String),

    /// The host engine version does not satisfy the manifest requirement.
    #[error("incompatible host engine: {0}")]
    IncompatibleEngine(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry of installed extensions.
///
/// Registration order is preserved and used to break ties deterministically
/// in topological orderings.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    /// Registered extensions indexed by id.
    extensions: HashMap<String, ExtensionMetadata>,
    /// Extension ids in registration order.
    order: Vec<String>,
    /// Host engine version, checked against manifest `engines` when set.
    host_version: Option<Version>,
}

impl ExtensionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that enforces `engines` compatibility for the
    /// `iridium` engine against the given host version.
    pub fn with_host_version(host_version: Version) -> Self {
        Self { host_version: Some(host_version), ..Self::default() }
    }

    /// Registers an extension, validating its manifest first.
    ///
    /// Re-registering an existing id overwrites: the manifest and install
    /// path are replaced, state resets to Installed, any recorded error is
    /// cleared, and the original registration-order slot is kept.
    pub fn register(
        &mut self,
        manifest: ExtensionManifest,
        install_path: impl Into<PathBuf>,
    ) -> Result<()> {
        manifest.validate()?;
        self.check_engine_compatibility(&manifest)?;
        self.check_conflicts(&manifest)?;

        let id = manifest.id.clone();
        let version = manifest.version.clone();
        let metadata = ExtensionMetadata {
            manifest,
            state: ExtensionState::Installed,
            install_path: install_path.into(),
            installed_at: Utc::now(),
            error: None,
        };

        if self.extensions.insert(id.clone(), metadata).is_none() {
            self.order.push(id.clone());
        }
        info!(extension = %id, version = %version, "extension registered");
        Ok(())
    }

    fn check_engine_compatibility(&self, manifest: &ExtensionManifest) -> Result<()> {
        let Some(host_version) = &self.host_version else {
            return Ok(());
        };
        let Some(requirement) = manifest.engines.get(HOST_ENGINE) else {
            return Ok(());
        };
        // The requirement syntax was already validated with the manifest.
        let satisfied =
            versioning::satisfies(&host_version.to_string(), requirement).unwrap_or(false);
        if satisfied {
            Ok(())
        } else {
            Err(RegistryError::IncompatibleEngine(format!(
                "'{}' requires iridium {}, host is {}",
                manifest.id, requirement, host_version
            )))
        }
    }

    /// Checks declared conflicts in both directions.
    fn check_conflicts(&self, manifest: &ExtensionManifest) -> Result<()> {
        for conflict in &manifest.conflicts {
            if conflict != &manifest.id && self.extensions.contains_key(conflict) {
                return Err(RegistryError::Conflict(format!(
                    "'{}' conflicts with installed extension '{}'",
                    manifest.id, conflict
                )));
            }
        }
        for (id, metadata) in &self.extensions {
            if id != &manifest.id && metadata.manifest.conflicts.contains(&manifest.id) {
                return Err(RegistryError::Conflict(format!(
                    "installed extension '{}' declares a conflict with '{}'",
                    id, manifest.id
                )));
            }
        }
        Ok(())
    }

    /// Gets an extension's metadata.
    pub fn get(&self, id: &str) -> Result<&ExtensionMetadata> {
        self.extensions.get(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// True when the id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.extensions.contains_key(id)
    }

    /// Registered extension ids in registration order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Iterates metadata in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionMetadata> {
        self.order.iter().filter_map(|id| self.extensions.get(id))
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// True when no extensions are registered.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Sets an extension's lifecycle state. Leaving the Error state clears
    /// the recorded error message.
    pub fn set_state(&mut self, id: &str, state: ExtensionState) -> Result<()> {
        let metadata =
            self.extensions.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        metadata.state = state;
        if state != ExtensionState::Error {
            metadata.error = None;
        }
        Ok(())
    }

    /// Transitions an extension to the Error state and records the reason,
    /// regardless of its prior state.
    pub fn set_error(&mut self, id: &str, message: impl Into<String>) -> Result<()> {
        let metadata =
            self.extensions.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let message = message.into();
        warn!(extension = %id, error = %message, "extension entered error state");
        metadata.state = ExtensionState::Error;
        metadata.error = Some(message);
        Ok(())
    }

    /// Ids of an extension's required (non-optional) direct dependencies.
    pub fn dependency_ids(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.get(id)?.manifest.required_dependency_ids())
    }

    /// Ids of an extension's optional direct dependencies.
    pub fn optional_dependency_ids(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.get(id)?.manifest.optional_dependency_ids())
    }

    /// Builds the dependency graph over all registered extensions.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_nodes(self.iter().map(|metadata| {
            (
                metadata.manifest.id.clone(),
                metadata.manifest.version.clone(),
                metadata.manifest.required_dependency_ids(),
            )
        }))
    }

    /// Builds the dependency graph restricted to the registered closure of
    /// the given ids (each id plus its transitive required dependencies).
    ///
    /// Unregistered ids are skipped; the loader reports them as missing.
    pub fn graph_for(&self, ids: &[String]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let mut queue: Vec<String> = ids.to_vec();
        let mut seen = std::collections::HashSet::new();

        while let Some(id) = queue.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(metadata) = self.extensions.get(&id) else {
                continue;
            };
            let deps = metadata.manifest.required_dependency_ids();
            queue.extend(deps.iter().cloned());
            graph.insert(id, metadata.manifest.version.clone(), deps);
        }

        graph
    }

    /// Deterministic topological activation order over the registered
    /// closure of the given ids, failing on cycles.
    pub fn activation_order(
        &self,
        ids: &[String],
    ) -> std::result::Result<Vec<String>, DependencyGraphError> {
        self.graph_for(ids).topological_sort()
    }
}
