//! Extension discovery and enumeration.
//!
//! Scans configured directories for installed extensions: each immediate
//! subdirectory containing an `iridium-extension.json` is a candidate.
//! Invalid manifests are reported as diagnostics, never as fatal errors, so
//! one broken extension cannot hide the rest.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::extensions::manifest::{ExtensionManifest, MANIFEST_FILE};
use crate::extensions::registry::ExtensionRegistry;

/// Extension discovery errors.
#[derive(Debug, Error)]
pub enum ExtensionDiscoveryError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, ExtensionDiscoveryError>;

/// Extension discovery options.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Extension directories to search. Missing directories are skipped.
    pub search_paths: Vec<PathBuf>,
}

/// An extension found on disk, not yet registered.
#[derive(Debug, Clone)]
pub struct DiscoveredExtension {
    /// The validated manifest.
    pub manifest: ExtensionManifest,
    /// The extension's installation directory.
    pub install_path: PathBuf,
}

/// A non-fatal problem found during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryDiagnostic {
    /// The directory or manifest the problem concerns.
    pub path: PathBuf,
    /// Human-readable description.
    pub message: String,
}

/// Result of a discovery scan.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Valid extensions found.
    pub extensions: Vec<DiscoveredExtension>,
    /// Problems encountered along the way.
    pub diagnostics: Vec<DiscoveryDiagnostic>,
}

/// Extension discovery service.
#[derive(Debug, Default)]
pub struct ExtensionDiscovery {
    options: DiscoveryOptions,
}

impl ExtensionDiscovery {
    /// Creates a discovery with default (empty) options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a discovery with custom options.
    pub fn with_options(options: DiscoveryOptions) -> Self {
        Self { options }
    }

    /// Discovers extensions across all configured search paths.
    pub fn discover_all(&self) -> Result<DiscoveryReport> {
        let mut report = DiscoveryReport::default();

        for search_path in &self.options.search_paths {
            if !search_path.exists() {
                continue;
            }
            self.scan_directory(search_path, &mut report)?;
        }

        info!(
            found = report.extensions.len(),
            diagnostics = report.diagnostics.len(),
            "extension discovery complete"
        );
        Ok(report)
    }

    /// Discovers extensions in a single directory.
    pub fn discover_in_directory(&self, dir: &Path) -> Result<DiscoveryReport> {
        let mut report = DiscoveryReport::default();
        if dir.exists() {
            self.scan_directory(dir, &mut report)?;
        }
        Ok(report)
    }

    fn scan_directory(&self, dir: &Path, report: &mut DiscoveryReport) -> Result<()> {
        let entries = std::fs::read_dir(dir)?;

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            // Skip hidden directories.
            if entry.file_name().to_str().is_some_and(|name| name.starts_with('.')) {
                continue;
            }

            let manifest_path = path.join(MANIFEST_FILE);
            if !manifest_path.exists() {
                continue;
            }

            match ExtensionManifest::load(&manifest_path) {
                Ok(manifest) => {
                    report
                        .extensions
                        .push(DiscoveredExtension { manifest, install_path: path });
                }
                Err(error) => {
                    warn!(path = %manifest_path.display(), error = %error, "skipping invalid manifest");
                    report.diagnostics.push(DiscoveryDiagnostic {
                        path: manifest_path,
                        message: error.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Discovers extensions and registers each with the registry.
    ///
    /// Registration failures (conflicts, engine incompatibility) become
    /// diagnostics; the rest of the batch still registers.
    pub fn register_all(&self, registry: &mut ExtensionRegistry) -> Result<DiscoveryReport> {
        let mut report = self.discover_all()?;
        let mut registered = Vec::new();

        for discovered in report.extensions.drain(..) {
            let install_path = discovered.install_path.clone();
            match registry.register(discovered.manifest.clone(), &install_path) {
                Ok(()) => registered.push(discovered),
                Err(error) => {
                    warn!(path = %install_path.display(), error = %error, "failed to register discovered extension");
                    report.diagnostics.push(DiscoveryDiagnostic {
                        path: install_path,
                        message: error.to_string(),
                    });
                }
            }
        }

        report.extensions = registered;
        Ok(report)
    }
}
