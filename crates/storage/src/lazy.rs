//! Resettable lazy entries
//!
//! A [`LazyEntry`] holds an instance that is created on first access and
//! can later be reset so the next access creates it again (for example
//! after a configuration file was edited).
//!
//! Creation uses double-checked locking on a reader/writer lock:
//!
//! ```text
//! 1. read lock   -> instance present? return it
//! 2. write lock  -> instance present? (someone beat us) return it
//! 3. create under the write lock, store, return with created = true
//! ```
//!
//! Unlike [`SharedStore::resolve`](crate::SharedStore::resolve), creation
//! happens under the lock, so the factory runs at most once per reset even
//! under contention. Use it for instances that are expensive or must not be
//! built twice.
//!
//! [`ConfiguredEntry`], [`LazyMap`] and [`LazyList`] pair entries with the
//! configuration they are built from. A configuration stored in a
//! [`SharedStore`] at `name` can be wrapped on demand with
//! [`SharedStore::lazy_entry`], [`SharedStore::lazy_list`] or
//! [`SharedStore::lazy_map`]; the wrapper lives at `name.lazy`.

use crate::store::SharedStore;
use cellar_core::CellKey;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of fetching a lazy entry
#[derive(Debug)]
pub struct Fetched<T> {
    /// The instance
    pub instance: Arc<T>,
    /// Whether this call created it
    pub created: bool,
}

/// Lazily-created, resettable instance
pub struct LazyEntry<T> {
    instance: RwLock<Option<Arc<T>>>,
}

impl<T> LazyEntry<T> {
    /// Create an empty entry
    pub fn new() -> Self {
        Self {
            instance: RwLock::new(None),
        }
    }

    /// Get the instance, creating it with `create` if the entry is empty
    pub fn get_or_create<F>(&self, create: F) -> Fetched<T>
    where
        F: FnOnce() -> T,
    {
        match self.try_get_or_create(|| Ok::<T, Infallible>(create())) {
            Ok(fetched) => fetched,
            Err(never) => match never {},
        }
    }

    /// Get the instance, creating it with a fallible `create`
    ///
    /// On failure the entry stays empty and the error is returned; the
    /// write lock is released either way.
    pub fn try_get_or_create<F, E>(&self, create: F) -> Result<Fetched<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(instance) = self.instance.read().as_ref() {
            return Ok(Fetched {
                instance: Arc::clone(instance),
                created: false,
            });
        }

        let mut slot = self.instance.write();
        if let Some(instance) = slot.as_ref() {
            return Ok(Fetched {
                instance: Arc::clone(instance),
                created: false,
            });
        }

        let instance = Arc::new(create()?);
        *slot = Some(Arc::clone(&instance));
        Ok(Fetched {
            instance,
            created: true,
        })
    }

    /// Current instance, without creating one
    pub fn get(&self) -> Option<Arc<T>> {
        self.instance.read().clone()
    }

    /// Check if the instance has been created
    pub fn is_created(&self) -> bool {
        self.instance.read().is_some()
    }

    /// Drop the instance so the next access creates it again
    ///
    /// Returns `true` if there was an instance to drop. Callers still
    /// holding the old `Arc` keep it.
    pub fn reset(&self) -> bool {
        self.instance.write().take().is_some()
    }
}

impl<T> Default for LazyEntry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LazyEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEntry")
            .field("created", &self.is_created())
            .finish()
    }
}

/// A configuration paired with the lazy instance built from it
///
/// The configuration never changes; resetting drops only the instance, so
/// the next access rebuilds it from the same configuration.
pub struct ConfiguredEntry<C, T> {
    config: Arc<C>,
    entry: LazyEntry<T>,
}

impl<C, T> ConfiguredEntry<C, T> {
    /// Wrap `config` with an empty entry
    pub fn new(config: C) -> Self {
        Self::from_arc(Arc::new(config))
    }

    /// Wrap a shared configuration with an empty entry
    pub fn from_arc(config: Arc<C>) -> Self {
        Self {
            config,
            entry: LazyEntry::new(),
        }
    }

    /// The configuration instances are built from
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Get the instance, building it from the configuration if needed
    pub fn get<F>(&self, create: F) -> Fetched<T>
    where
        F: FnOnce(&C) -> T,
    {
        self.entry.get_or_create(|| create(&self.config))
    }

    /// Fallible form of [`get`](Self::get)
    pub fn try_get<F, E>(&self, create: F) -> Result<Fetched<T>, E>
    where
        F: FnOnce(&C) -> Result<T, E>,
    {
        self.entry.try_get_or_create(|| create(&self.config))
    }

    /// Current instance, without building one
    pub fn instance(&self) -> Option<Arc<T>> {
        self.entry.get()
    }

    /// Drop the instance; returns `true` if there was one
    pub fn reset(&self) -> bool {
        self.entry.reset()
    }
}

impl<C: fmt::Debug, T> fmt::Debug for ConfiguredEntry<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredEntry")
            .field("config", &self.config)
            .field("created", &self.entry.is_created())
            .finish()
    }
}

/// Named lazy entries, each carrying the configuration it is built from
///
/// Configurations are registered up front (typically from settings); the
/// instances are built on first access by a factory that receives the
/// configuration.
///
/// ```
/// use cellar_storage::LazyMap;
///
/// let pools: LazyMap<String, String> = LazyMap::new("pools");
/// pools.register("db.main", "mysql://localhost/main".to_string());
///
/// let url = pools.get("db.main", |config| format!("pool({})", config)).unwrap();
/// assert_eq!(*url, "pool(mysql://localhost/main)");
/// assert!(pools.get("db.other", |c| c.clone()).is_none());
/// ```
pub struct LazyMap<C, T> {
    name: String,
    entries: DashMap<CellKey, Arc<ConfiguredEntry<C, T>>>,
}

impl<C, T> LazyMap<C, T> {
    /// Create an empty map; `name` appears in log lines
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    /// Register (or replace) the configuration for `key`
    ///
    /// Replacing drops any instance built from the old configuration.
    pub fn register(&self, key: impl Into<CellKey>, config: C) {
        self.entries
            .insert(key.into(), Arc::new(ConfiguredEntry::new(config)));
    }

    /// Register every `(key, config)` pair
    ///
    /// Each pair is inserted separately; concurrent readers may see some of
    /// them before the rest.
    pub fn extend<K, I>(&self, configs: I)
    where
        K: Into<CellKey>,
        I: IntoIterator<Item = (K, C)>,
    {
        for (key, config) in configs {
            self.register(key, config);
        }
    }

    /// Get the instance for `key`, building it from its configuration if needed
    ///
    /// Returns `None` if nothing is registered under `key`.
    pub fn get<F>(&self, key: impl Into<CellKey>, create: F) -> Option<Arc<T>>
    where
        F: FnOnce(&C) -> T,
    {
        match self.try_get(key, |config| Ok::<T, Infallible>(create(config))) {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get`](Self::get)
    pub fn try_get<F, E>(&self, key: impl Into<CellKey>, create: F) -> Result<Option<Arc<T>>, E>
    where
        F: FnOnce(&C) -> Result<T, E>,
    {
        let key = key.into();
        // Release the map guard before building.
        let configured = match self.entries.get(&key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(None),
        };

        let fetched = configured.try_get(create).map_err(|e| {
            warn!(map = %self.name, key = %key, "lazy entry creation failed");
            e
        })?;
        if fetched.created {
            info!(map = %self.name, key = %key, "created lazy entry");
        }
        Ok(Some(fetched.instance))
    }

    /// Every instance keyed by name, building missing ones; sorted by key
    pub fn instances<F>(&self, mut create: F) -> Vec<(CellKey, Arc<T>)>
    where
        F: FnMut(&C) -> T,
    {
        let mut configured: Vec<_> = self
            .entries
            .iter()
            .map(|item| (item.key().clone(), Arc::clone(item.value())))
            .collect();
        configured.sort_by(|a, b| a.0.cmp(&b.0));

        configured
            .into_iter()
            .map(|(key, entry)| {
                let fetched = entry.get(&mut create);
                if fetched.created {
                    info!(map = %self.name, key = %key, "created lazy entry");
                }
                (key, fetched.instance)
            })
            .collect()
    }

    /// Reset every entry; returns how many instances were dropped
    pub fn reset(&self) -> usize {
        let mut reset = 0;
        for item in self.entries.iter() {
            if item.value().reset() {
                info!(map = %self.name, key = %item.key(), "reset lazy entry");
                reset += 1;
            }
        }
        reset
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C, T> fmt::Debug for LazyMap<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyMap")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Ordered lazy entries, each built from its own configuration
///
/// ```
/// use cellar_storage::LazyList;
///
/// let handlers: LazyList<&str, String> = LazyList::new("handlers");
/// handlers.extend(["gzip", "etag"]);
///
/// let built = handlers.to_vec(|name| format!("{}-filter", name));
/// assert_eq!(*built[1], "etag-filter");
/// assert_eq!(handlers.reset(), 2);
/// ```
pub struct LazyList<C, T> {
    name: String,
    entries: RwLock<Vec<Arc<ConfiguredEntry<C, T>>>>,
}

impl<C, T> LazyList<C, T> {
    /// Create an empty list; `name` appears in log lines
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append a configuration
    pub fn push(&self, config: C) {
        self.entries
            .write()
            .push(Arc::new(ConfiguredEntry::new(config)));
    }

    /// Append every configuration, one at a time
    pub fn extend<I>(&self, configs: I)
    where
        I: IntoIterator<Item = C>,
    {
        for config in configs {
            self.push(config);
        }
    }

    /// Replace the configuration at `index`
    ///
    /// Returns `false` if `index` is out of range.
    pub fn set(&self, index: usize, config: C) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(index) {
            Some(slot) => {
                *slot = Arc::new(ConfiguredEntry::new(config));
                true
            }
            None => false,
        }
    }

    /// Get the instance at `index`, building it if needed
    pub fn get<F>(&self, index: usize, create: F) -> Option<Arc<T>>
    where
        F: FnOnce(&C) -> T,
    {
        match self.try_get(index, |config| Ok::<T, Infallible>(create(config))) {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get`](Self::get)
    pub fn try_get<F, E>(&self, index: usize, create: F) -> Result<Option<Arc<T>>, E>
    where
        F: FnOnce(&C) -> Result<T, E>,
    {
        let configured = match self.entries.read().get(index) {
            Some(entry) => Arc::clone(entry),
            None => return Ok(None),
        };

        let fetched = configured.try_get(create).map_err(|e| {
            warn!(list = %self.name, index, "lazy entry creation failed");
            e
        })?;
        if fetched.created {
            info!(list = %self.name, index, "created lazy entry");
        }
        Ok(Some(fetched.instance))
    }

    /// Every instance in order, building missing ones
    pub fn to_vec<F>(&self, mut create: F) -> Vec<Arc<T>>
    where
        F: FnMut(&C) -> T,
    {
        // Snapshot the entries so factories run without the list lock.
        let entries = self.entries.read().clone();
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let fetched = entry.get(&mut create);
                if fetched.created {
                    info!(list = %self.name, index, "created lazy entry");
                }
                fetched.instance
            })
            .collect()
    }

    /// Reset every entry; returns how many instances were dropped
    pub fn reset(&self) -> usize {
        let entries = self.entries.read();
        let mut reset = 0;
        for (index, entry) in entries.iter().enumerate() {
            if entry.reset() {
                info!(list = %self.name, index, "reset lazy entry");
                reset += 1;
            }
        }
        reset
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the list has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<C, T> fmt::Debug for LazyList<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyList")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}

// ============================================================================
// Store-backed lazy globals
// ============================================================================

/// Segment appended to a configuration key to name its lazy wrapper
pub const LAZY_SUFFIX: &str = "lazy";

impl SharedStore {
    /// Lazy entry for the configuration stored at `name`
    ///
    /// The configuration (a `C`) is read from `name` and wrapped in a
    /// [`ConfiguredEntry`] installed at `name.lazy` through
    /// [`resolve`](Self::resolve), so racing callers converge on one
    /// wrapper. Returns `None` if neither the wrapper nor the
    /// configuration exists.
    ///
    /// ```
    /// use cellar_storage::SharedStore;
    ///
    /// let store = SharedStore::new();
    /// store.set("db.engine", "mysql://localhost/stickre".to_string()).unwrap();
    ///
    /// let entry = store.lazy_entry::<String, usize>("db.engine").unwrap().unwrap();
    /// assert_eq!(*entry.get(|url| url.len()).instance, 25);
    /// assert!(store.contains("db.engine.lazy"));
    /// ```
    pub fn lazy_entry<C, T>(
        &self,
        name: impl Into<CellKey>,
    ) -> cellar_core::Result<Option<Arc<ConfiguredEntry<C, T>>>>
    where
        C: Any + Send + Sync,
        T: Any + Send + Sync,
    {
        let name = name.into();
        let lazy_key = name.child(LAZY_SUFFIX);
        if let Some(existing) = self.get::<ConfiguredEntry<C, T>>(&lazy_key)? {
            return Ok(Some(existing));
        }
        let config = match self.get::<C>(&name)? {
            Some(config) => config,
            None => return Ok(None),
        };
        self.resolve(lazy_key, || ConfiguredEntry::<C, T>::from_arc(config))
            .map(Some)
    }

    /// Lazy list for the configurations stored at `name` as a `Vec<C>`
    ///
    /// Installed at `name.lazy` the same way as
    /// [`lazy_entry`](Self::lazy_entry).
    pub fn lazy_list<C, T>(
        &self,
        name: impl Into<CellKey>,
    ) -> cellar_core::Result<Option<Arc<LazyList<C, T>>>>
    where
        C: Clone + Any + Send + Sync,
        T: Any + Send + Sync,
    {
        let name = name.into();
        let lazy_key = name.child(LAZY_SUFFIX);
        if let Some(existing) = self.get::<LazyList<C, T>>(&lazy_key)? {
            return Ok(Some(existing));
        }
        let configs = match self.get::<Vec<C>>(&name)? {
            Some(configs) => configs,
            None => return Ok(None),
        };
        self.resolve(lazy_key, || {
            let list: LazyList<C, T> = LazyList::new(name.as_str());
            list.extend(configs.iter().cloned());
            list
        })
        .map(Some)
    }

    /// Lazy map for the configurations stored at `name` as a
    /// `BTreeMap<String, C>`
    ///
    /// Installed at `name.lazy` the same way as
    /// [`lazy_entry`](Self::lazy_entry).
    pub fn lazy_map<C, T>(
        &self,
        name: impl Into<CellKey>,
    ) -> cellar_core::Result<Option<Arc<LazyMap<C, T>>>>
    where
        C: Clone + Any + Send + Sync,
        T: Any + Send + Sync,
    {
        let name = name.into();
        let lazy_key = name.child(LAZY_SUFFIX);
        if let Some(existing) = self.get::<LazyMap<C, T>>(&lazy_key)? {
            return Ok(Some(existing));
        }
        let configs = match self.get::<BTreeMap<String, C>>(&name)? {
            Some(configs) => configs,
            None => return Ok(None),
        };
        self.resolve(lazy_key, || {
            let map: LazyMap<C, T> = LazyMap::new(name.as_str());
            map.extend(
                configs
                    .iter()
                    .map(|(key, config)| (CellKey::new(key.as_str()), config.clone())),
            );
            map
        })
        .map(Some)
    }
}
