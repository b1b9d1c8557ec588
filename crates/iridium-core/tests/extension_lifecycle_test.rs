//! End-to-end extension lifecycle tests: discovery, registration, bulk
//! load/activate, events, deactivation, and failure isolation.

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use iridium_core::extensions::{
    ActivationContext, DiscoveryOptions, ExtensionDiscovery, ExtensionEventKind, ExtensionLoader,
    ExtensionModule, ExtensionRegistry, ExtensionState, MANIFEST_FILE, StaticModuleResolver,
};

struct RecordingModule {
    id: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ExtensionModule for RecordingModule {
    async fn activate(&self, ctx: &mut ActivationContext) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("activate:{}", self.id));
        let log = self.log.clone();
        let id = self.id.clone();
        ctx.add_subscription(move || log.lock().unwrap().push(format!("dispose:{id}")));
        Ok(())
    }

    async fn deactivate(&self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("deactivate:{}", self.id));
        Ok(())
    }
}

fn write_extension(root: &Path, id: &str, dependencies: &[&str]) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    let deps = dependencies
        .iter()
        .map(|dep| format!(r#"{{"id": "{dep}", "version": "^1.0.0"}}"#))
        .collect::<Vec<_>>()
        .join(", ");
    fs::write(
        dir.join(MANIFEST_FILE),
        format!(
            r#"{{
                "id": "{id}",
                "name": "{id}",
                "version": "1.0.0",
                "description": "Lifecycle test extension",
                "author": {{"name": "Unicorn", "email": "hello@unicorn.love"}},
                "category": "integration",
                "main": "index",
                "activationEvents": ["onStartup"],
                "dependencies": [{deps}]
            }}"#
        ),
    )
    .unwrap();
}

fn state_of(loader: &ExtensionLoader, id: &str) -> ExtensionState {
    loader.registry().read().unwrap().get(id).unwrap().state
}

#[tokio::test]
async fn test_full_lifecycle_from_discovery_to_unload() {
    let temp_dir = TempDir::new().unwrap();
    write_extension(temp_dir.path(), "base-ext", &[]);
    write_extension(temp_dir.path(), "mid-ext", &["base-ext"]);
    write_extension(temp_dir.path(), "top-ext", &["mid-ext"]);

    let discovery = ExtensionDiscovery::with_options(DiscoveryOptions {
        search_paths: vec![temp_dir.path().to_path_buf()],
    });

    let mut registry = ExtensionRegistry::new();
    let report = discovery.register_all(&mut registry).unwrap();
    assert_eq!(report.extensions.len(), 3);
    assert!(report.diagnostics.is_empty());

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = StaticModuleResolver::new();
    for discovered in &report.extensions {
        resolver.link(
            discovered.install_path.clone(),
            Arc::new(RecordingModule {
                id: discovered.manifest.id.clone(),
                log: log.clone(),
            }),
        );
    }

    let mut loader = ExtensionLoader::new(registry, Arc::new(resolver));

    let events = Arc::new(Mutex::new(Vec::new()));
    {
        let events = events.clone();
        loader.events().subscribe(move |event| {
            events.lock().unwrap().push((event.kind, event.extension_id.clone()));
        });
    }

    loader.load_all().await.unwrap();
    assert_eq!(loader.load_order().len(), 3);

    loader.activate_all().await.unwrap();
    for id in ["base-ext", "mid-ext", "top-ext"] {
        assert_eq!(state_of(&loader, id), ExtensionState::Enabled);
    }

    // Dependencies activate strictly before their dependents.
    {
        let log = log.lock().unwrap();
        let pos = |entry: &str| log.iter().position(|l| l == entry).unwrap();
        assert!(pos("activate:base-ext") < pos("activate:mid-ext"));
        assert!(pos("activate:mid-ext") < pos("activate:top-ext"));
    }

    loader.deactivate_all().await.unwrap();
    for id in ["base-ext", "mid-ext", "top-ext"] {
        assert_eq!(state_of(&loader, id), ExtensionState::Disabled);
    }

    // Dependents deactivate before their dependencies, and every
    // subscription is disposed.
    {
        let log = log.lock().unwrap();
        let pos = |entry: &str| log.iter().position(|l| l == entry).unwrap();
        assert!(pos("deactivate:top-ext") < pos("deactivate:base-ext"));
        assert_eq!(log.iter().filter(|l| l.starts_with("dispose:")).count(), 3);
    }

    loader.unload("top-ext").await.unwrap();
    assert!(!loader.is_loaded("top-ext"));
    assert!(loader.is_loaded("base-ext"));

    // The event stream saw every lifecycle transition.
    let events = events.lock().unwrap();
    let count = |kind: ExtensionEventKind| events.iter().filter(|(k, _)| *k == kind).count();
    assert_eq!(count(ExtensionEventKind::Loaded), 3);
    assert_eq!(count(ExtensionEventKind::Activated), 3);
    assert_eq!(count(ExtensionEventKind::Deactivated), 3);
}

#[tokio::test]
async fn test_cycle_rejects_bulk_load_without_side_effects() {
    let temp_dir = TempDir::new().unwrap();
    write_extension(temp_dir.path(), "ext-1", &["ext-2"]);
    write_extension(temp_dir.path(), "ext-2", &["ext-1"]);

    let discovery = ExtensionDiscovery::with_options(DiscoveryOptions {
        search_paths: vec![temp_dir.path().to_path_buf()],
    });
    let mut registry = ExtensionRegistry::new();
    discovery.register_all(&mut registry).unwrap();

    let mut loader = ExtensionLoader::new(registry, Arc::new(StaticModuleResolver::new()));

    let error = loader.load_all().await.unwrap_err();
    assert!(error.to_string().contains("Circular dependency"));
    assert_eq!(state_of(&loader, "ext-1"), ExtensionState::Installed);
    assert_eq!(state_of(&loader, "ext-2"), ExtensionState::Installed);
    assert!(loader.load_order().is_empty());
}

#[tokio::test]
async fn test_bulk_operations_isolate_individual_failures() {
    let temp_dir = TempDir::new().unwrap();
    write_extension(temp_dir.path(), "working-ext", &[]);
    write_extension(temp_dir.path(), "orphan-ext", &[]);

    let discovery = ExtensionDiscovery::with_options(DiscoveryOptions {
        search_paths: vec![temp_dir.path().to_path_buf()],
    });
    let mut registry = ExtensionRegistry::new();
    let report = discovery.register_all(&mut registry).unwrap();

    // Only working-ext gets a module; orphan-ext has nothing to resolve.
    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = StaticModuleResolver::new();
    for discovered in &report.extensions {
        if discovered.manifest.id == "working-ext" {
            resolver.link(
                discovered.install_path.clone(),
                Arc::new(RecordingModule {
                    id: discovered.manifest.id.clone(),
                    log: log.clone(),
                }),
            );
        }
    }

    let mut loader = ExtensionLoader::new(registry, Arc::new(resolver));
    loader.load_all().await.unwrap();

    assert!(loader.is_loaded("working-ext"));
    assert!(!loader.is_loaded("orphan-ext"));
    assert_eq!(state_of(&loader, "orphan-ext"), ExtensionState::Error);

    loader.activate_all().await.unwrap();
    assert_eq!(state_of(&loader, "working-ext"), ExtensionState::Enabled);
    assert_eq!(state_of(&loader, "orphan-ext"), ExtensionState::Error);

    loader.clear();
    assert!(!loader.is_loaded("working-ext"));
    assert!(loader.load_order().is_empty());
}
