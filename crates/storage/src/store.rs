//! Shared cell store
//!
//! A keyed store of lazily-computed values that is safe under concurrent
//! first access without a store-wide lock.
//!
//! # Design
//!
//! - DashMap: sharded map, readers never block each other
//! - Values are type-erased `Arc<dyn Any + Send + Sync>`, downcast on access
//! - Initialization is compute-then-insert-if-absent: the default is computed
//!   with no lock held, then offered to the map through the `entry` API which
//!   holds only the target shard's lock
//!
//! # Race Resolution
//!
//! Any number of callers may compute a candidate for the same empty key.
//! Exactly one candidate is inserted; every other caller drops its own
//! candidate and returns the stored one. Callers therefore always converge on
//! the same `Arc` (pointer-equal). A discarded candidate is dropped outside
//! the shard lock, so its `Drop` may do arbitrary work.
//!
//! # Overwrites
//!
//! [`SharedStore::set`] replaces a cell unconditionally. It does not
//! coordinate with a concurrent [`SharedStore::resolve`] of the same key or
//! with callers still holding the previous `Arc`: a resolve racing a set may
//! return either value, and existing holders keep the old one. This is a
//! known race, kept as last-write-wins.

use crate::config::StoreConfig;
use crate::metrics::{MetricsSnapshot, StoreMetrics};
use cellar_core::{CellKey, Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Type-erased cell value
pub type CellValue = Arc<dyn Any + Send + Sync>;

/// Keyed store of lazily-initialized shared values
///
/// A store is passed explicitly to whoever needs it (usually wrapped in an
/// `Arc`); there is no ambient global instance.
///
/// # Example
///
/// ```
/// use cellar_storage::SharedStore;
///
/// let store = SharedStore::new();
/// let a = store.resolve("app.counter", || 41u64).unwrap();
/// let b = store.resolve("app.counter", || 99u64).unwrap();
/// assert_eq!(*b, 41);
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
pub struct SharedStore {
    cells: DashMap<CellKey, CellValue>,
    metrics: StoreMetrics,
}

impl SharedStore {
    /// Create an empty store with default sizing
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
            metrics: StoreMetrics::new(),
        }
    }

    /// Create an empty store with room for `capacity` cells
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: DashMap::with_capacity(capacity),
            metrics: StoreMetrics::new(),
        }
    }

    /// Create a store from a validated configuration
    pub fn with_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let cells = match config.shard_amount {
            Some(shards) => DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards),
            None => DashMap::with_capacity(config.initial_capacity),
        };
        Ok(Self {
            cells,
            metrics: StoreMetrics::new(),
        })
    }

    // ========================================================================
    // Lazy Resolution
    // ========================================================================

    /// Get the value for `key`, computing and installing a default if absent
    ///
    /// `compute_default` runs without any lock held and may run on several
    /// racing threads at once; all but one result are dropped. It should be
    /// cheap to discard.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the key is empty or has an empty segment
    /// - `WrongType` if the cell already holds a value that is not a `T`
    pub fn resolve<T, F>(&self, key: impl Into<CellKey>, compute_default: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.try_resolve(key, || Ok::<T, Infallible>(compute_default()))
            .map_err(|e| match e {
                ResolveError::Cell(e) => e,
                ResolveError::Init(never) => match never {},
            })
    }

    /// Like [`resolve`](Self::resolve), but the default computation may fail
    ///
    /// A failure propagates to this caller only. Nothing is inserted, so the
    /// store is unchanged and the next access computes again. Other callers
    /// racing on the same key are unaffected.
    pub fn try_resolve<T, E, F>(
        &self,
        key: impl Into<CellKey>,
        compute_default: F,
    ) -> std::result::Result<Arc<T>, ResolveError<E>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let key = key.into();
        key.validate()?;

        // Fast path: no computation, only a shard read lock.
        if let Some(existing) = self.lookup(&key) {
            self.metrics.record_hit();
            return Ok(downcast(&key, existing)?);
        }

        let candidate = match compute_default() {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.metrics.record_failed_initialization();
                warn!(key = %key, "cell initialization failed");
                return Err(ResolveError::Init(e));
            }
        };

        let existing = match self.cells.entry(key.clone()) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                let value: CellValue = candidate.clone();
                vacant.insert(value);
                self.metrics.record_initialization();
                debug!(key = %key, "cell initialized");
                return Ok(candidate);
            }
        };

        // Another caller won; our candidate is dropped here, outside the shard lock.
        self.metrics.record_lost_race();
        debug!(key = %key, "cell initialization lost race, adopting stored value");
        drop(candidate);
        Ok(downcast(&key, existing)?)
    }

    // ========================================================================
    // Direct Access
    // ========================================================================

    /// Get the value for `key` without initializing it
    pub fn get<T>(&self, key: impl Into<CellKey>) -> Result<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        match self.lookup(&key) {
            Some(value) => downcast(&key, value).map(Some),
            None => Ok(None),
        }
    }

    /// Unconditionally overwrite the value for `key`
    ///
    /// Returns the new value. See the module docs for the race this does not
    /// guard against.
    pub fn set<T>(&self, key: impl Into<CellKey>, value: T) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let value = Arc::new(value);
        self.set_arc(key, Arc::clone(&value))?;
        Ok(value)
    }

    /// Overwrite the value for `key` with an existing `Arc`
    pub fn set_arc<T>(&self, key: impl Into<CellKey>, value: Arc<T>) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        key.validate()?;
        let previous = self.cells.insert(key, value);
        self.metrics.record_overwrite();
        drop(previous);
        Ok(())
    }

    /// Remove the cell for `key`; the next resolve initializes it again
    ///
    /// Returns `true` if a cell was removed.
    pub fn remove(&self, key: impl Into<CellKey>) -> bool {
        let key = key.into();
        let removed = self.cells.remove(&key);
        if removed.is_some() {
            debug!(key = %key, "cell removed");
        }
        removed.is_some()
    }

    /// Check if a cell exists for `key`
    pub fn contains(&self, key: impl Into<CellKey>) -> bool {
        self.cells.contains_key(&key.into())
    }

    /// Remove every cell
    pub fn clear(&self) {
        self.cells.clear();
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the store has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<CellKey> {
        let mut keys: Vec<_> = self.cells.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Keys under `namespace` at any depth, sorted
    ///
    /// `keys_in("javascript")` matches `javascript.state` and
    /// `javascript.state.lazy`, but not `javascriptx.state`.
    pub fn keys_in(&self, namespace: &str) -> Vec<CellKey> {
        let prefix = format!("{}.", namespace);
        let mut keys: Vec<_> = self
            .cells
            .iter()
            .filter(|entry| entry.key().as_str().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Resolution counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Clone the stored `Arc` out so the shard guard is released immediately
    fn lookup(&self, key: &CellKey) -> Option<CellValue> {
        self.cells.get(key).map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStore")
            .field("cells", &self.cells.len())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

fn downcast<T>(key: &CellKey, value: CellValue) -> Result<Arc<T>>
where
    T: Any + Send + Sync,
{
    value
        .downcast::<T>()
        .map_err(|_| Error::wrong_type::<T>(key.as_str()))
}

/// Error from [`SharedStore::try_resolve`]
///
/// Keeps the caller's own initialization error distinct from cell errors.
#[derive(Debug)]
pub enum ResolveError<E> {
    /// The key was invalid or the cell held another type
    Cell(Error),
    /// The default computation failed
    Init(E),
}

impl<E> ResolveError<E> {
    /// The initialization error, if that is what failed
    pub fn into_init(self) -> Option<E> {
        match self {
            ResolveError::Init(e) => Some(e),
            ResolveError::Cell(_) => None,
        }
    }
}

impl<E> From<Error> for ResolveError<E> {
    fn from(e: Error) -> Self {
        ResolveError::Cell(e)
    }
}

impl<E: fmt::Display> fmt::Display for ResolveError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Cell(e) => write!(f, "{}", e),
            ResolveError::Init(e) => write!(f, "initialization failed: {}", e),
        }
    }
}

impl<E> std::error::Error for ResolveError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Cell(e) => Some(e),
            ResolveError::Init(e) => Some(e),
        }
    }
}
