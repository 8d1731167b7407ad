//! Application context: application globals and shared globals.
//!
//! A [`Cellar`] is what request handlers receive explicitly. It owns the
//! application-scoped store and a handle to a store shared with every other
//! application built from the same shared store.

use crate::error::{Error, Result};
use crate::resource::StateResource;
use cellar_core::{CellKey, Scope};
use cellar_primitives::{Document, DocumentCell};
use cellar_storage::{ConfiguredEntry, SharedStore, StoreConfig};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tracing::info;

/// Globals for one application.
///
/// # Example
///
/// ```
/// use cellar::Cellar;
///
/// let app = Cellar::new("prudence-example");
/// let hits = app.global("counter.start", || 0u64).unwrap();
/// assert_eq!(*hits, 0);
///
/// // A sibling application sees the shared globals but not ours.
/// let admin = app.sibling("prudence-admin");
/// app.shared_global("engine.url", || "mysql://localhost".to_string()).unwrap();
/// assert!(admin.shared_globals().contains("engine.url"));
/// assert!(!admin.globals().contains("counter.start"));
/// ```
#[derive(Debug, Clone)]
pub struct Cellar {
    name: String,
    globals: Arc<SharedStore>,
    shared: Arc<SharedStore>,
}

impl Cellar {
    /// Create an application with its own fresh stores.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_stores(
            name,
            Arc::new(SharedStore::new()),
            Arc::new(SharedStore::new()),
        )
    }

    /// Create a builder for application configuration.
    pub fn builder() -> CellarBuilder {
        CellarBuilder::new()
    }

    /// Create an application from a deserialized configuration.
    pub fn from_config(config: &CellarConfig) -> Result<Self> {
        Self::builder()
            .name(&config.name)
            .store(config.store.clone())
            .build()
    }

    fn with_stores(
        name: impl Into<String>,
        globals: Arc<SharedStore>,
        shared: Arc<SharedStore>,
    ) -> Self {
        let name = name.into();
        info!(application = %name, "application globals created");
        Self {
            name,
            globals,
            shared,
        }
    }

    /// Create another application that shares this one's shared globals.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::with_stores(
            name,
            Arc::new(SharedStore::new()),
            Arc::clone(&self.shared),
        )
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store visible only to this application.
    pub fn globals(&self) -> &Arc<SharedStore> {
        &self.globals
    }

    /// Store shared with sibling applications.
    pub fn shared_globals(&self) -> &Arc<SharedStore> {
        &self.shared
    }

    /// Store for `scope`.
    pub fn store(&self, scope: Scope) -> &Arc<SharedStore> {
        match scope {
            Scope::Application => &self.globals,
            Scope::Shared => &self.shared,
        }
    }

    /// Resolve an application global, computing `default` on first access.
    pub fn global<T, F>(&self, name: impl Into<CellKey>, default: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.global_in(Scope::Application, name, default)
    }

    /// Resolve a shared global, computing `default` on first access.
    pub fn shared_global<T, F>(&self, name: impl Into<CellKey>, default: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.global_in(Scope::Shared, name, default)
    }

    /// Resolve a global in an explicit scope.
    pub fn global_in<T, F>(&self, scope: Scope, name: impl Into<CellKey>, default: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.store(scope).resolve(name, default).map_err(Error::from)
    }

    /// Overwrite an application global.
    pub fn set_global<T>(&self, name: impl Into<CellKey>, value: T) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.globals.set(name, value).map_err(Error::from)
    }

    /// Lazy entry for the configuration in application global `name`.
    ///
    /// The wrapper lives at `name.lazy`; see [`SharedStore::lazy_entry`].
    pub fn lazy_global<C, T>(
        &self,
        name: impl Into<CellKey>,
    ) -> Result<Option<Arc<ConfiguredEntry<C, T>>>>
    where
        C: Any + Send + Sync,
        T: Any + Send + Sync,
    {
        self.globals.lazy_entry(name).map_err(Error::from)
    }

    /// Guarded document stored in the application globals under `name`.
    pub fn document<F>(&self, name: impl Into<CellKey>, default: F) -> DocumentCell
    where
        F: Fn() -> Document + Send + Sync + 'static,
    {
        DocumentCell::new(Arc::clone(&self.globals), name, default)
    }

    /// JSON state resource whose document lives at `namespace.state`.
    pub fn state_resource<F>(&self, namespace: &str, default: F) -> StateResource
    where
        F: Fn() -> Document + Send + Sync + 'static,
    {
        StateResource::new(self.document(CellKey::namespaced(namespace, "state"), default))
    }

    /// Drop every application global; shared globals are untouched.
    pub fn reset(&self) {
        info!(application = %self.name, cells = self.globals.len(), "clearing application globals");
        self.globals.clear();
    }
}

/// Serializable application configuration.
///
/// ```
/// use cellar::CellarConfig;
///
/// let config = CellarConfig::from_json(r#"{"name": "stickstick", "store": {"initial_capacity": 32}}"#).unwrap();
/// assert_eq!(config.name, "stickstick");
/// assert_eq!(config.store.initial_capacity, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellarConfig {
    /// Application name
    pub name: String,
    /// Sizing of the application store
    pub store: StoreConfig,
}

impl Default for CellarConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            store: StoreConfig::default(),
        }
    }
}

impl CellarConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Builder for application configuration.
///
/// ```
/// use cellar::Cellar;
///
/// let app = Cellar::builder()
///     .name("stickstick")
///     .initial_capacity(64)
///     .shard_amount(8)
///     .build()
///     .unwrap();
/// assert_eq!(app.name(), "stickstick");
/// ```
#[derive(Debug, Default)]
pub struct CellarBuilder {
    name: Option<String>,
    store: StoreConfig,
    shared: Option<Arc<SharedStore>>,
}

impl CellarBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the store configuration.
    pub fn store(mut self, config: StoreConfig) -> Self {
        self.store = config;
        self
    }

    /// Pre-allocate room for `capacity` application globals.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.store = self.store.initial_capacity(capacity);
        self
    }

    /// Set the shard count of the application store.
    pub fn shard_amount(mut self, shards: usize) -> Self {
        self.store = self.store.shard_amount(shards);
        self
    }

    /// Share globals with other applications through `shared`.
    pub fn shared(mut self, shared: Arc<SharedStore>) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Build the application.
    pub fn build(self) -> Result<Cellar> {
        let name = self.name.unwrap_or_else(|| CellarConfig::default().name);
        let globals = Arc::new(SharedStore::with_config(&self.store)?);
        let shared = self
            .shared
            .unwrap_or_else(|| Arc::new(SharedStore::new()));
        Ok(Cellar::with_stores(name, globals, shared))
    }
}
