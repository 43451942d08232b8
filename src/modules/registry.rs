//! Concurrent, append-only map of extension names to module handles.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Namespace every extension key lives under.
pub const EXT_PREFIX: &str = "k6/x/";

/// Opaque, shared handle to an extension module.
pub type ModuleHandle = Arc<dyn Any + Send + Sync>;

static REGISTRY: LazyLock<ModuleRegistry> = LazyLock::new(ModuleRegistry::new);

/// The process-wide registry used by [`get_module`] and [`register_module`].
pub fn global() -> &'static ModuleRegistry {
    &REGISTRY
}

/// Returns the module registered under `name` in the process-wide registry.
pub fn get_module(name: &str) -> Option<ModuleHandle> {
    REGISTRY.lookup(name)
}

/// Registers `module` in the process-wide registry, importable as `k6/x/<name>`.
///
/// # Panics
/// Panics if a module with the same normalised name is already registered.
pub fn register_module(name: &str, module: ModuleHandle) {
    REGISTRY.register(name, module)
}

/// Prepends [`EXT_PREFIX`] unless `name` already carries it.
pub fn normalize_name(name: &str) -> String {
    if name.starts_with(EXT_PREFIX) {
        name.to_string()
    } else {
        format!("{EXT_PREFIX}{name}")
    }
}

/// Raised (as a panic payload) when a normalised key is registered twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConflict {
    pub name: String,
}

impl fmt::Display for RegistrationConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module already registered: {}", self.name)
    }
}

impl std::error::Error for RegistrationConflict {}

/// Thread-safe registry of extension modules.
///
/// Lookups only take a shard read lock, so readers never wait on each other.
/// Registration holds the shard write lock across the existence check and the
/// insert, so a reader sees either no entry or the complete handle.
#[derive(Default)]
pub struct ModuleRegistry {
    inner: DashMap<String, ModuleHandle>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Look up a module by its exact key. No normalisation is applied.
    pub fn lookup(&self, name: &str) -> Option<ModuleHandle> {
        self.inner.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a module and downcast it to its concrete type.
    pub fn lookup_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.lookup(name).and_then(|module| module.downcast::<T>().ok())
    }

    /// Register a module under `name`, normalised with [`normalize_name`].
    ///
    /// # Panics
    /// Panics with a [`RegistrationConflict`] message if the normalised key
    /// already exists. This is a build-time wiring bug, not a runtime state.
    pub fn register(&self, name: &str, module: ModuleHandle) {
        if let Err(conflict) = self.insert_unique(normalize_name(name), module) {
            tracing::error!(module = %conflict.name, "Duplicate module registration");
            panic!("{conflict}");
        }
        tracing::debug!(module = %normalize_name(name), "Module registered");
    }

    /// Sorted list of every registered key.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn insert_unique(&self, key: String, module: ModuleHandle) -> Result<(), RegistrationConflict> {
        match self.inner.entry(key) {
            Entry::Occupied(existing) => Err(RegistrationConflict {
                name: existing.key().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(module);
                Ok(())
            }
        }
    }
}
