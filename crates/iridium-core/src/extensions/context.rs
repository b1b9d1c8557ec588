//! Per-activation context handed to an extension's activate hook.
//!
//! The context lives exactly as long as the extension stays enabled and
//! collects the disposable subscriptions the hook registers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::extensions::manifest::ExtensionManifest;
use crate::extensions::registry::ExtensionRegistry;

/// A disposable handle registered during activation.
type Subscription = Box<dyn FnOnce() + Send>;

/// Scope object owned by the loader for one activated extension.
pub struct ActivationContext {
    extension_id: String,
    extension_path: PathBuf,
    manifest: ExtensionManifest,
    registry: Arc<RwLock<ExtensionRegistry>>,
    subscriptions: Vec<Subscription>,
}

impl ActivationContext {
    /// Creates a context for an extension about to be activated.
    pub fn new(
        extension_id: impl Into<String>,
        extension_path: impl Into<PathBuf>,
        manifest: ExtensionManifest,
        registry: Arc<RwLock<ExtensionRegistry>>,
    ) -> Self {
        Self {
            extension_id: extension_id.into(),
            extension_path: extension_path.into(),
            manifest,
            registry,
            subscriptions: Vec::new(),
        }
    }

    /// The extension's id.
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// The extension's install path.
    pub fn extension_path(&self) -> &Path {
        &self.extension_path
    }

    /// The extension's manifest.
    pub fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    /// Shared handle to the extension registry.
    pub fn registry(&self) -> Arc<RwLock<ExtensionRegistry>> {
        self.registry.clone()
    }

    /// Registers a disposable handle released on deactivation.
    pub fn add_subscription(&mut self, dispose: impl FnOnce() + Send + 'static) {
        self.subscriptions.push(Box::new(dispose));
    }

    /// Number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Disposes every subscription in LIFO order: the last handle registered
    /// is released first, mirroring drop order for scoped resources.
    pub fn dispose_all(&mut self) {
        let count = self.subscriptions.len();
        while let Some(dispose) = self.subscriptions.pop() {
            dispose();
        }
        if count > 0 {
            debug!(extension = %self.extension_id, subscriptions = count, "disposed subscriptions");
        }
    }
}

impl fmt::Debug for ActivationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationContext")
            .field("extension_id", &self.extension_id)
            .field("extension_path", &self.extension_path)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::manifest::{ExtensionAuthor, ExtensionCategory};
    use std::sync::Mutex;

    fn manifest(id: &str) -> ExtensionManifest {
        ExtensionManifest {
            id: id.to_string(),
            name: id.to_string(),
            version: "1.0.0".to_string(),
            description: "test".to_string(),
            author: ExtensionAuthor::Name("Author".to_string()),
            category: ExtensionCategory::Utility,
            keywords: Vec::new(),
            main: "index".to_string(),
            dependencies: Vec::new(),
            permissions: Vec::new(),
            activation_events: Vec::new(),
            engines: std::collections::HashMap::new(),
            contributes: None,
            conflicts: Vec::new(),
        }
    }

    fn context(id: &str) -> ActivationContext {
        ActivationContext::new(
            id,
            format!("/ext/{id}"),
            manifest(id),
            Arc::new(RwLock::new(ExtensionRegistry::new())),
        )
    }

    #[test]
    fn test_accessors() {
        let ctx = context("test-ext");
        assert_eq!(ctx.extension_id(), "test-ext");
        assert_eq!(ctx.extension_path(), Path::new("/ext/test-ext"));
        assert_eq!(ctx.manifest().id, "test-ext");
        assert_eq!(ctx.subscription_count(), 0);
    }

    #[test]
    fn test_dispose_all_runs_lifo() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context("test-ext");

        for label in ["first", "second", "third"] {
            let order = order.clone();
            ctx.add_subscription(move || order.lock().unwrap().push(label));
        }
        assert_eq!(ctx.subscription_count(), 3);

        ctx.dispose_all();
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
        assert_eq!(ctx.subscription_count(), 0);
    }

    #[test]
    fn test_dispose_all_is_idempotent() {
        let count = Arc::new(Mutex::new(0));
        let mut ctx = context("test-ext");
        {
            let count = count.clone();
            ctx.add_subscription(move || *count.lock().unwrap() += 1);
        }

        ctx.dispose_all();
        ctx.dispose_all();
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
