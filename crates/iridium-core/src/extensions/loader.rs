//! Extension loader: sequences the extension lifecycle.
//!
//! Orchestrates load, activate, deactivate, and unload for one or many
//! extensions, enforcing dependency order, detecting cycles before any side
//! effect, isolating per-extension failures in bulk operations, and emitting
//! lifecycle events.
//!
//! Operations are asynchronous (they may suspend while the module resolver
//! or an extension's own hook runs) but the loader never spawns parallel
//! work: dependency-first ordering comes from sequential awaiting. Callers
//! must await each operation before issuing the next for the same id.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extensions::context::ActivationContext;
use crate::extensions::dependency_graph::DependencyGraphError;
use crate::extensions::events::{ExtensionEvent, ExtensionEventBus, ExtensionEventKind};
use crate::extensions::module::{ExtensionModule, ModuleResolver};
use crate::extensions::registry::{ExtensionRegistry, ExtensionState, RegistryError};
use crate::extensions::versioning;

/// Extension loader errors.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Registry error (unknown id, conflict, ...).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Dependency graph error, including circular dependencies.
    #[error(transparent)]
    Graph(#[from] DependencyGraphError),

    /// The module resolver failed to produce a module.
    #[error("failed to load extension '{id}': {source}")]
    Resolve {
        /// Extension id.
        id: String,
        /// Underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// The extension's activate hook failed.
    #[error("failed to activate extension '{id}': {source}")]
    Activate {
        /// Extension id.
        id: String,
        /// Underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// The extension's deactivate hook failed.
    #[error("failed to deactivate extension '{id}': {source}")]
    Deactivate {
        /// Extension id.
        id: String,
        /// Underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// A required dependency is not registered.
    #[error("missing required dependency '{dependency}' of extension '{id}'")]
    MissingDependency {
        /// Extension id.
        id: String,
        /// The missing dependency id.
        dependency: String,
    },

    /// A required dependency is registered but could not be activated.
    #[error("required dependency '{dependency}' of extension '{id}' is not active")]
    DependencyNotActive {
        /// Extension id.
        id: String,
        /// The inactive dependency id.
        dependency: String,
    },

    /// A required dependency's installed version does not satisfy the
    /// declared requirement.
    #[error(
        "dependency '{dependency}' of extension '{id}' is version {installed}, \
         which does not satisfy '{requirement}'"
    )]
    DependencyVersionMismatch {
        /// Extension id.
        id: String,
        /// The dependency id.
        dependency: String,
        /// Installed dependency version.
        installed: String,
        /// Declared requirement.
        requirement: String,
    },

    /// The extension is in the Error state and cannot be activated.
    #[error("extension '{id}' is in error state: {message}")]
    ExtensionFailed {
        /// Extension id.
        id: String,
        /// Recorded failure reason.
        message: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Orchestrates the extension lifecycle against a shared registry.
///
/// The loader assumes a single logical caller drives lifecycle operations
/// for a given extension id at a time; concurrent callers must serialize
/// per id.
pub struct ExtensionLoader {
    registry: Arc<RwLock<ExtensionRegistry>>,
    resolver: Arc<dyn ModuleResolver>,
    modules: HashMap<String, Arc<dyn ExtensionModule>>,
    contexts: HashMap<String, ActivationContext>,
    load_order: Vec<String>,
    events: ExtensionEventBus,
}

impl ExtensionLoader {
    /// Creates a loader owning a fresh shared handle to the registry.
    pub fn new(registry: ExtensionRegistry, resolver: Arc<dyn ModuleResolver>) -> Self {
        Self::with_shared_registry(Arc::new(RwLock::new(registry)), resolver)
    }

    /// Creates a loader over an already-shared registry handle.
    pub fn with_shared_registry(
        registry: Arc<RwLock<ExtensionRegistry>>,
        resolver: Arc<dyn ModuleResolver>,
    ) -> Self {
        Self {
            registry,
            resolver,
            modules: HashMap::new(),
            contexts: HashMap::new(),
            load_order: Vec::new(),
            events: ExtensionEventBus::new(),
        }
    }

    /// Shared handle to the registry.
    pub fn registry(&self) -> Arc<RwLock<ExtensionRegistry>> {
        self.registry.clone()
    }

    /// The lifecycle event bus.
    pub fn events(&self) -> &ExtensionEventBus {
        &self.events
    }

    fn registry_read(&self) -> RwLockReadGuard<'_, ExtensionRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_write(&self) -> RwLockWriteGuard<'_, ExtensionRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads an extension's module through the injected resolver.
    ///
    /// Idempotent: a second call returns the cached module without invoking
    /// the resolver again. Loading does not change lifecycle state; load and
    /// activate are distinct steps.
    pub async fn load(&mut self, id: &str) -> Result<Arc<dyn ExtensionModule>> {
        if let Some(module) = self.modules.get(id) {
            return Ok(module.clone());
        }

        let install_path = self.registry_read().get(id)?.install_path.clone();

        match self.resolver.resolve(id, &install_path).await {
            Ok(module) => {
                self.modules.insert(id.to_string(), module.clone());
                if !self.load_order.iter().any(|loaded| loaded == id) {
                    self.load_order.push(id.to_string());
                }
                info!(extension = %id, "extension module loaded");
                self.events.emit(&ExtensionEvent::new(ExtensionEventKind::Loaded, id));
                Ok(module)
            }
            Err(source) => {
                let message = format!("{source:#}");
                let _ = self.registry_write().set_error(id, message.clone());
                warn!(extension = %id, error = %message, "extension module failed to load");
                self.events.emit(&ExtensionEvent::with_message(
                    ExtensionEventKind::LoadError,
                    id,
                    message,
                ));
                Err(LoaderError::Resolve { id: id.to_string(), source })
            }
        }
    }

    /// Activates an extension, activating its required dependencies first.
    ///
    /// Idempotent: activating an already-enabled extension is a no-op and
    /// does not re-invoke the module's activate hook. Every required
    /// dependency reaches Enabled strictly before the extension itself. A
    /// cycle in the dependency closure fails before any side effect.
    pub async fn activate(&mut self, id: &str) -> Result<()> {
        let state = self.registry_read().get(id)?.state;
        if state == ExtensionState::Enabled {
            return Ok(());
        }

        let plan = self.registry_read().activation_order(&[id.to_string()])?;
        for ext_id in plan {
            self.activate_one(&ext_id).await?;
        }
        Ok(())
    }

    /// Activates a single extension whose required dependencies are already
    /// settled (activated earlier in a dependency-ordered plan).
    async fn activate_one(&mut self, id: &str) -> Result<()> {
        let (state, manifest, install_path, error) = {
            let registry = self.registry_read();
            let metadata = registry.get(id)?;
            (
                metadata.state,
                metadata.manifest.clone(),
                metadata.install_path.clone(),
                metadata.error.clone(),
            )
        };

        match state {
            ExtensionState::Enabled => return Ok(()),
            ExtensionState::Error => {
                return Err(LoaderError::ExtensionFailed {
                    id: id.to_string(),
                    message: error.unwrap_or_else(|| "unknown failure".to_string()),
                });
            }
            _ => {}
        }

        for dependency in manifest.dependencies.iter().filter(|d| !d.optional) {
            let dep_state = {
                let registry = self.registry_read();
                match registry.get(&dependency.id) {
                    Ok(dep_metadata) => {
                        Some((dep_metadata.state, dep_metadata.manifest.version.clone()))
                    }
                    Err(_) => None,
                }
            };

            let Some((dep_state, dep_version)) = dep_state else {
                let message = format!("missing required dependency '{}'", dependency.id);
                self.fail_activation(id, &message);
                return Err(LoaderError::MissingDependency {
                    id: id.to_string(),
                    dependency: dependency.id.clone(),
                });
            };

            // Requirement syntax was validated with the manifest.
            let satisfied =
                versioning::satisfies(&dep_version, &dependency.version).unwrap_or(true);
            if !satisfied {
                let message = format!(
                    "dependency '{}' is version {}, which does not satisfy '{}'",
                    dependency.id, dep_version, dependency.version
                );
                self.fail_activation(id, &message);
                return Err(LoaderError::DependencyVersionMismatch {
                    id: id.to_string(),
                    dependency: dependency.id.clone(),
                    installed: dep_version,
                    requirement: dependency.version.clone(),
                });
            }

            if dep_state != ExtensionState::Enabled {
                let message =
                    format!("required dependency '{}' is not active", dependency.id);
                self.fail_activation(id, &message);
                return Err(LoaderError::DependencyNotActive {
                    id: id.to_string(),
                    dependency: dependency.id.clone(),
                });
            }
        }

        let module = self.load(id).await?;

        let mut ctx =
            ActivationContext::new(id, install_path, manifest, self.registry.clone());
        match module.activate(&mut ctx).await {
            Ok(()) => {
                self.contexts.insert(id.to_string(), ctx);
                let _ = self.registry_write().set_state(id, ExtensionState::Enabled);
                info!(extension = %id, "extension activated");
                self.events.emit(&ExtensionEvent::new(ExtensionEventKind::Activated, id));
                Ok(())
            }
            Err(source) => {
                let message = format!("{source:#}");
                self.fail_activation(id, &message);
                Err(LoaderError::Activate { id: id.to_string(), source })
            }
        }
    }

    fn fail_activation(&mut self, id: &str, message: &str) {
        let _ = self.registry_write().set_error(id, message);
        warn!(extension = %id, error = %message, "extension activation failed");
        self.events.emit(&ExtensionEvent::with_message(
            ExtensionEventKind::ActivationError,
            id,
            message,
        ));
    }

    /// Deactivates an extension.
    ///
    /// Idempotent: deactivating an extension that is not currently enabled
    /// is a no-op. Subscriptions registered during activation are disposed
    /// in LIFO order even when the deactivate hook fails; a hook failure
    /// leaves the extension in the Error state.
    pub async fn deactivate(&mut self, id: &str) -> Result<()> {
        let state = self.registry_read().get(id)?.state;
        if state != ExtensionState::Enabled {
            return Ok(());
        }

        let module = self.modules.get(id).cloned();
        let hook_result = match module {
            Some(module) => module.deactivate().await,
            None => Ok(()),
        };

        if let Some(mut ctx) = self.contexts.remove(id) {
            ctx.dispose_all();
        }

        match hook_result {
            Ok(()) => {
                let _ = self.registry_write().set_state(id, ExtensionState::Disabled);
                info!(extension = %id, "extension deactivated");
                self.events.emit(&ExtensionEvent::new(ExtensionEventKind::Deactivated, id));
                Ok(())
            }
            Err(source) => {
                let message = format!("{source:#}");
                let _ = self.registry_write().set_error(id, message.clone());
                warn!(extension = %id, error = %message, "extension deactivation failed");
                self.events.emit(&ExtensionEvent::with_message(
                    ExtensionEventKind::DeactivationError,
                    id,
                    message,
                ));
                Err(LoaderError::Deactivate { id: id.to_string(), source })
            }
        }
    }

    /// Unloads an extension's module, deactivating first when enabled.
    ///
    /// Idempotent: unloading an extension that is not loaded is a no-op.
    /// The load-order history keeps the first-load position.
    pub async fn unload(&mut self, id: &str) -> Result<()> {
        let state = self.registry_read().get(id)?.state;
        if state == ExtensionState::Enabled {
            self.deactivate(id).await?;
        }

        if self.modules.remove(id).is_some() {
            debug!(extension = %id, "extension module unloaded");
        }
        Ok(())
    }

    /// Loads every registered extension in dependency order.
    ///
    /// Fails fast with the offending cycle before loading anything when the
    /// dependency graph is cyclic. Individual load failures are recorded on
    /// the extension and do not abort the batch.
    pub async fn load_all(&mut self) -> Result<()> {
        let order = self.registry_read().graph().topological_sort()?;

        for id in order {
            if let Err(error) = self.load(&id).await {
                warn!(extension = %id, error = %error, "continuing past load failure");
            }
        }
        Ok(())
    }

    /// Activates every registered extension in dependency order.
    ///
    /// Extensions already in the Error state are skipped untouched, not
    /// retried. Individual activation failures are recorded and do not
    /// abort the batch; only a dependency cycle rejects the whole
    /// operation.
    pub async fn activate_all(&mut self) -> Result<()> {
        let order = self.registry_read().graph().topological_sort()?;

        for id in order {
            let state = {
                let registry = self.registry_read();
                match registry.get(&id) {
                    Ok(metadata) => metadata.state,
                    Err(_) => continue,
                }
            };
            match state {
                ExtensionState::Error => {
                    debug!(extension = %id, "skipping extension in error state");
                    continue;
                }
                ExtensionState::Enabled => continue,
                _ => {}
            }

            if let Err(error) = self.activate_one(&id).await {
                warn!(extension = %id, error = %error, "continuing past activation failure");
            }
        }
        Ok(())
    }

    /// Deactivates every enabled extension, dependents before their
    /// dependencies (reverse topological order). Individual failures do not
    /// abort the batch.
    pub async fn deactivate_all(&mut self) -> Result<()> {
        let order = self.registry_read().graph().topological_sort()?;

        for id in order.into_iter().rev() {
            let enabled = self
                .registry_read()
                .get(&id)
                .map(|metadata| metadata.state == ExtensionState::Enabled)
                .unwrap_or(false);
            if !enabled {
                continue;
            }
            if let Err(error) = self.deactivate(&id).await {
                warn!(extension = %id, error = %error, "continuing past deactivation failure");
            }
        }
        Ok(())
    }

    /// Gets the cached module for an extension, if loaded.
    pub fn get_module(&self, id: &str) -> Option<Arc<dyn ExtensionModule>> {
        self.modules.get(id).cloned()
    }

    /// Gets the activation context; present only while the extension is
    /// enabled.
    pub fn context(&self, id: &str) -> Option<&ActivationContext> {
        self.contexts.get(id)
    }

    /// True when the extension's module is loaded.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Extension ids in the order their modules were first loaded.
    pub fn load_order(&self) -> &[String] {
        &self.load_order
    }

    /// Drops all caches and the load order. Registry state is untouched.
    /// Remaining subscriptions are disposed.
    pub fn clear(&mut self) {
        for (_, mut ctx) in self.contexts.drain() {
            ctx.dispose_all();
        }
        self.modules.clear();
        self.load_order.clear();
        debug!("extension loader caches cleared");
    }
}
