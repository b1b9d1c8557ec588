//! Iridium Core - Extension lifecycle engine.
//!
//! This crate provides the core functionality for Iridium's extension system:
//! - Manifest validation and parsing
//! - A dependency-aware registry of installed extensions
//! - A loader that sequences import, activation, deactivation, and unloading
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use iridium_core::extensions::{
//!     ExtensionLoader, ExtensionManifest, ExtensionRegistry, StaticModuleResolver,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = ExtensionRegistry::new();
//! let manifest = ExtensionManifest::load(std::path::Path::new(
//!     "extensions/hello-world/iridium-extension.json",
//! ))?;
//! registry.register(manifest, "extensions/hello-world")?;
//!
//! let resolver = Arc::new(StaticModuleResolver::new());
//! let mut loader = ExtensionLoader::new(registry, resolver);
//! loader.load_all().await?;
//! loader.activate_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod extensions;

pub use extensions::context::ActivationContext;
pub use extensions::dependency_graph::{DependencyGraph, DependencyGraphError};
pub use extensions::discovery::{
    DiscoveryOptions, DiscoveryReport, ExtensionDiscovery, ExtensionDiscoveryError,
};
pub use extensions::events::{ExtensionEvent, ExtensionEventBus, ExtensionEventKind};
pub use extensions::loader::{ExtensionLoader, LoaderError};
pub use extensions::manifest::{
    ExtensionManifest, ExtensionManifestError, ManifestCheck, is_valid_extension_id,
    is_valid_version,
};
pub use extensions::module::{ExtensionModule, ModuleResolver, StaticModuleResolver};
pub use extensions::registry::{
    ExtensionMetadata, ExtensionRegistry, ExtensionState, RegistryError,
};
pub use extensions::{ExtensionError, Result};
