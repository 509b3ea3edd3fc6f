//! Symbol Provider Framework
//!
//! A provider turns a descriptor on disk into build units carrying a
//! semantic model. The IR builder only ever sees the `BuildUnit` values;
//! how a provider locates and loads a codebase is its own business.
//!
//! Providers are registered once per process in a lazily initialized
//! registry (see [`registry`]).

pub mod dump;
pub mod symbols;

pub use dump::DumpProvider;
pub use symbols::{BuildUnit, Compilation, NamespaceSymbol, TypeRef, TypeSymbol};

use crate::{Error, Result};
use std::path::Path;
use std::sync::OnceLock;

/// What a descriptor path stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// A single build unit (project)
    Unit,
    /// A manifest enumerating several build units (solution)
    Aggregate,
}

impl DescriptorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorKind::Unit => "unit",
            DescriptorKind::Aggregate => "aggregate",
        }
    }
}

/// Trait for symbol providers
///
/// Each provider is responsible for:
/// 1. Recognizing the descriptors it understands
/// 2. Loading one build unit per project, in a stable order
/// 3. Reporting units it could not load as units without a compilation
pub trait SymbolProvider: Send + Sync {
    /// Provider name (for display)
    fn name(&self) -> &str;

    /// Classify a descriptor path, `None` if this provider does not handle it
    fn descriptor_kind(&self, path: &Path) -> Option<DescriptorKind>;

    /// Base name for artifacts derived from the descriptor
    fn descriptor_stem(&self, path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Load every build unit named by the descriptor
    fn load(&self, path: &Path) -> Result<Vec<BuildUnit>>;
}

/// Registry of symbol providers
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn SymbolProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    pub fn register(&mut self, provider: impl SymbolProvider + 'static) {
        self.providers.push(Box::new(provider));
    }

    /// Find the provider for a descriptor along with what it describes
    pub fn find_provider(&self, path: &Path) -> Option<(&dyn SymbolProvider, DescriptorKind)> {
        self.providers
            .iter()
            .find_map(|p| p.descriptor_kind(path).map(|kind| (p.as_ref(), kind)))
    }

    /// Load a descriptor with the matching provider.
    ///
    /// Fails with `Error::Input` before any work if no provider recognizes
    /// the path.
    pub fn load(&self, path: &Path) -> Result<Vec<BuildUnit>> {
        let (provider, kind) = self.find_provider(path).ok_or_else(|| {
            Error::Input(format!(
                "{} is neither a build unit nor an aggregate descriptor",
                path.display()
            ))
        })?;

        tracing::debug!(
            provider = provider.name(),
            kind = kind.as_str(),
            path = %path.display(),
            "loading descriptor"
        );
        let units = provider.load(path)?;
        tracing::info!(units = units.len(), path = %path.display(), "descriptor loaded");
        Ok(units)
    }
}

/// Create a registry with all built-in providers
pub fn default_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(DumpProvider::new());
    registry
}

static REGISTRY: OnceLock<ProviderRegistry> = OnceLock::new();

/// The process-wide provider registry, built on first use.
pub fn registry() -> &'static ProviderRegistry {
    REGISTRY.get_or_init(|| {
        tracing::debug!("registering symbol providers");
        default_registry()
    })
}
