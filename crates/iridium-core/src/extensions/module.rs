//! Module contract and code-loading capability.
//!
//! An extension's runtime behavior lives in its module, obtained through an
//! injected [`ModuleResolver`]. The core never decides how code is located
//! or executed; hosts plug in their own loading mechanism at this seam.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::extensions::context::ActivationContext;

/// Runtime module implemented by an extension.
///
/// Both lifecycle hooks are optional: the default bodies are no-ops, and an
/// extension that overrides neither is still perfectly valid.
#[async_trait]
pub trait ExtensionModule: Send + Sync {
    /// Called when the extension is activated.
    async fn activate(&self, _ctx: &mut ActivationContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the extension is deactivated.
    async fn deactivate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn ExtensionModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ExtensionModule")
    }
}

/// Injected code-loading capability: maps an install path to a module.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    /// Resolves the runtime module for an extension.
    async fn resolve(
        &self,
        extension_id: &str,
        install_path: &Path,
    ) -> anyhow::Result<Arc<dyn ExtensionModule>>;
}

/// Process-wide module table keyed by install path.
///
/// The compiled-language rendition of dynamic import: extensions are linked
/// into the host and registered here, and the install path becomes a lookup
/// key rather than something that is executed.
#[derive(Default)]
pub struct StaticModuleResolver {
    modules: RwLock<HashMap<PathBuf, Arc<dyn ExtensionModule>>>,
}

impl StaticModuleResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links a module under an install path, replacing any previous entry.
    pub fn link(&self, install_path: impl Into<PathBuf>, module: Arc<dyn ExtensionModule>) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(install_path.into(), module);
    }

    /// Number of linked modules.
    pub fn len(&self) -> usize {
        self.modules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when no modules are linked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ModuleResolver for StaticModuleResolver {
    async fn resolve(
        &self,
        extension_id: &str,
        install_path: &Path,
    ) -> anyhow::Result<Arc<dyn ExtensionModule>> {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        modules.get(install_path).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "no module linked for extension '{}' at {}",
                extension_id,
                install_path.display()
            )
        })
    }
}
