//! GuardedDocument: JSON object behind a reader/writer lock
//!
//! ## Locking
//!
//! The payload lives inside a `parking_lot::RwLock`, so it cannot be touched
//! without holding the lock in the matching mode:
//! - Reads (`read`, `with_read`, `render`) take the shared lock; any number
//!   may run at once
//! - Writes (`merge`, `replace`, `clear`, `with_write`, `try_update`) take
//!   the exclusive lock; a write waits for current readers and earlier
//!   writers, and blocks new readers until it finishes
//!
//! Guards are released on every exit path, including a panic inside a
//! closure. `parking_lot` locks do not poison, so a document whose writer
//! panicked stays usable.
//!
//! ## Merge vs Replace
//!
//! `merge` overwrites only the top-level fields present in the patch.
//! `replace` swaps the whole payload. Both bump the document version once.

use cellar_core::{Error, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fmt;

/// Payload of a guarded document: a JSON object
pub type Document = Map<String, Value>;

struct Guarded {
    payload: Document,
    /// Incremented on every write
    version: u64,
}

/// JSON object shared between threads, readers concurrent, writers exclusive
///
/// # Example
///
/// ```
/// use cellar_primitives::GuardedDocument;
/// use serde_json::json;
///
/// let doc = GuardedDocument::from_value(json!({"a": 1, "b": 2})).unwrap();
/// doc.merge_value(json!({"b": 3, "c": 4})).unwrap();
/// assert_eq!(doc.to_value(), json!({"a": 1, "b": 3, "c": 4}));
/// ```
pub struct GuardedDocument {
    inner: RwLock<Guarded>,
}

impl GuardedDocument {
    /// Create a document holding `payload`
    pub fn new(payload: Document) -> Self {
        Self {
            inner: RwLock::new(Guarded {
                payload,
                version: 0,
            }),
        }
    }

    /// Create an empty document
    pub fn empty() -> Self {
        Self::new(Document::new())
    }

    /// Create a document from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        into_object(value).map(Self::new)
    }

    // ========================================================================
    // Reads (shared lock)
    // ========================================================================

    /// Snapshot of the payload
    pub fn read(&self) -> Document {
        self.inner.read().payload.clone()
    }

    /// Snapshot of the payload together with its version
    pub fn read_versioned(&self) -> (Document, u64) {
        let guard = self.inner.read();
        (guard.payload.clone(), guard.version)
    }

    /// Snapshot as a `serde_json::Value::Object`
    pub fn to_value(&self) -> Value {
        Value::Object(self.read())
    }

    /// Run `f` with shared access to the payload
    pub fn with_read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        let guard = self.inner.read();
        f(&guard.payload)
    }

    /// Render the payload as JSON text under the shared lock
    pub fn render(&self) -> Result<String> {
        self.with_read(|payload| {
            serde_json::to_string(payload).map_err(|e| Error::Serialization(e.to_string()))
        })
    }

    /// Value of one top-level field
    pub fn get(&self, field: &str) -> Option<Value> {
        self.with_read(|payload| payload.get(field).cloned())
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.inner.read().payload.len()
    }

    /// Check if the payload has no fields
    pub fn is_empty(&self) -> bool {
        self.inner.read().payload.is_empty()
    }

    /// Number of writes applied so far
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    // ========================================================================
    // Writes (exclusive lock)
    // ========================================================================

    /// Overwrite every field named in `patch`; other fields are untouched
    ///
    /// Readers see either the whole patch or none of it. An empty patch is
    /// not a write and leaves the version alone.
    pub fn merge(&self, patch: Document) {
        if patch.is_empty() {
            return;
        }
        let mut guard = self.inner.write();
        for (field, value) in patch {
            guard.payload.insert(field, value);
        }
        guard.version += 1;
    }

    /// [`merge`](Self::merge) with a JSON value, which must be an object
    pub fn merge_value(&self, patch: Value) -> Result<()> {
        self.merge(into_object(patch)?);
        Ok(())
    }

    /// Replace the whole payload
    pub fn replace(&self, payload: Document) {
        let mut guard = self.inner.write();
        guard.payload = payload;
        guard.version += 1;
    }

    /// [`replace`](Self::replace) with a JSON value, which must be an object
    pub fn replace_value(&self, payload: Value) -> Result<()> {
        self.replace(into_object(payload)?);
        Ok(())
    }

    /// Equivalent to `replace({})`
    pub fn clear(&self) {
        self.replace(Document::new());
    }

    /// Run `f` with exclusive access to the payload
    ///
    /// `f` mutates in place, so a panic midway leaves whatever it already
    /// changed, but the version only advances once `f` returns. Use
    /// [`try_update`](Self::try_update) when a failed mutation must leave no
    /// trace.
    pub fn with_write<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Document) -> R,
    {
        let mut guard = self.inner.write();
        let result = f(&mut guard.payload);
        guard.version += 1;
        result
    }

    /// Apply a fallible mutation atomically
    ///
    /// `f` runs on a staged copy; the copy is swapped in only if `f`
    /// returns `Ok`. On error the payload and version are unchanged.
    pub fn try_update<R, E, F>(&self, f: F) -> std::result::Result<R, E>
    where
        F: FnOnce(&mut Document) -> std::result::Result<R, E>,
    {
        let mut guard = self.inner.write();
        let mut staged = guard.payload.clone();
        let result = f(&mut staged)?;
        guard.payload = staged;
        guard.version += 1;
        Ok(result)
    }
}

impl Default for GuardedDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for GuardedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(guard) => f
                .debug_struct("GuardedDocument")
                .field("payload", &guard.payload)
                .field("version", &guard.version)
                .finish(),
            None => f
                .debug_struct("GuardedDocument")
                .field("payload", &"<locked>")
                .finish(),
        }
    }
}

/// Unwrap a JSON object, rejecting every other kind of value
pub fn into_object(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidDocument(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
