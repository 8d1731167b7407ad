//! DocumentCell: a guarded document living in a shared store
//!
//! ## Design: STATELESS FACADE
//!
//! DocumentCell holds only the store, the key and the default factory. The
//! document itself lives in the [`SharedStore`] and is resolved on every
//! operation, so any number of DocumentCell values with the same key (in
//! different handlers, on different threads) all operate on the same
//! document. The first operation on an empty key installs the default;
//! racing first operations converge on a single document.
//!
//! The lock and the payload share one cell: the `RwLock` owns the payload,
//! so resolving one resolves the other.
//!
//! ## Reset
//!
//! [`DocumentCell::reset`] installs a fresh default document with an
//! unconditional store `set`. Operations that already resolved the previous
//! document finish against it; that write is then lost.

use crate::document::{Document, GuardedDocument};
use cellar_core::{CellKey, Result};
use cellar_storage::SharedStore;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type DefaultFn = dyn Fn() -> Document + Send + Sync;

/// Handle to a lazily-created guarded document stored under a key
#[derive(Clone)]
pub struct DocumentCell {
    store: Arc<SharedStore>,
    key: CellKey,
    default: Arc<DefaultFn>,
}

impl DocumentCell {
    /// Create a handle; nothing is stored until the first operation
    pub fn new<F>(store: Arc<SharedStore>, key: impl Into<CellKey>, default: F) -> Self
    where
        F: Fn() -> Document + Send + Sync + 'static,
    {
        Self {
            store,
            key: key.into(),
            default: Arc::new(default),
        }
    }

    /// Create a handle whose default is an empty document
    pub fn empty(store: Arc<SharedStore>, key: impl Into<CellKey>) -> Self {
        Self::new(store, key, Document::new)
    }

    /// Key the document is stored under
    pub fn key(&self) -> &CellKey {
        &self.key
    }

    /// Resolve the document, installing the default if absent
    pub fn document(&self) -> Result<Arc<GuardedDocument>> {
        self.store
            .resolve(&self.key, || GuardedDocument::new((self.default)()))
    }

    /// Snapshot of the payload
    pub fn read(&self) -> Result<Document> {
        Ok(self.document()?.read())
    }

    /// Snapshot as a JSON value
    pub fn to_value(&self) -> Result<Value> {
        Ok(self.document()?.to_value())
    }

    /// Render as JSON text
    pub fn render(&self) -> Result<String> {
        self.document()?.render()
    }

    /// Field-wise merge
    pub fn merge(&self, patch: Document) -> Result<()> {
        self.document()?.merge(patch);
        Ok(())
    }

    /// Field-wise merge of a JSON object
    pub fn merge_value(&self, patch: Value) -> Result<()> {
        self.document()?.merge_value(patch)
    }

    /// Replace the payload under the document's write lock
    pub fn replace(&self, payload: Document) -> Result<()> {
        self.document()?.replace(payload);
        Ok(())
    }

    /// Replace the payload with a JSON object
    pub fn replace_value(&self, payload: Value) -> Result<()> {
        self.document()?.replace_value(payload)
    }

    /// Empty the payload
    pub fn clear(&self) -> Result<()> {
        self.document()?.clear();
        Ok(())
    }

    /// Install a fresh default document, discarding the current one
    pub fn reset(&self) -> Result<Arc<GuardedDocument>> {
        debug!(key = %self.key, "resetting document to default");
        self.store
            .set(&self.key, GuardedDocument::new((self.default)()))
    }
}

impl fmt::Debug for DocumentCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentCell")
            .field("key", &self.key)
            .finish()
    }
}
