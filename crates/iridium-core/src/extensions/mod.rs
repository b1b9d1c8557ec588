//! Extension system for Iridium.
//!
//! Provides manifest validation, a dependency-aware registry of installed
//! extensions, and a loader that sequences the extension lifecycle
//! (load, activate, deactivate, unload) in dependency order.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use iridium_core::extensions::{ExtensionLoader, ExtensionRegistry, StaticModuleResolver};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ExtensionRegistry::new();
//! let mut loader = ExtensionLoader::new(registry, Arc::new(StaticModuleResolver::new()));
//! loader.activate("hello-world").await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod dependency_graph;
pub mod discovery;
pub mod events;
pub mod loader;
pub mod manifest;
pub mod module;
pub mod registry;
pub mod versioning;

pub use context::ActivationContext;
pub use dependency_graph::{DependencyGraph, DependencyGraphError};
pub use discovery::{
    DiscoveredExtension, DiscoveryDiagnostic, DiscoveryOptions, DiscoveryReport,
    ExtensionDiscovery, ExtensionDiscoveryError,
};
pub use events::{ExtensionEvent, ExtensionEventBus, ExtensionEventKind};
pub use loader::{ExtensionLoader, LoaderError};
pub use manifest::{
    ExtensionAuthor, ExtensionCategory, ExtensionDependency, ExtensionManifest,
    ExtensionManifestError, ExtensionPermission, MANIFEST_FILE, ManifestCheck,
    is_valid_extension_id, is_valid_version,
};
pub use module::{ExtensionModule, ModuleResolver, StaticModuleResolver};
pub use registry::{ExtensionMetadata, ExtensionRegistry, ExtensionState, RegistryError};
pub use versioning::VersioningError;

/// Unified error type for extension operations.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// Manifest error.
    #[error("manifest error: {0}")]
    Manifest(#[from] ExtensionManifestError),

    /// Versioning error.
    #[error("versioning error: {0}")]
    Versioning(#[from] VersioningError),

    /// Dependency graph error.
    #[error("dependency graph error: {0}")]
    Graph(#[from] DependencyGraphError),

    /// Registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Loader error.
    #[error("loader error: {0}")]
    Loader(#[from] LoaderError),

    /// Discovery error.
    #[error("discovery error: {0}")]
    Discovery(#[from] ExtensionDiscoveryError),
}

/// Result type for extension operations.
pub type Result<T> = std::result::Result<T, ExtensionError>;
