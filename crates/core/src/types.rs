//! Core types for shared cells
//!
//! This module defines the addressing types used throughout the workspace:
//! - [`CellKey`]: Key of a cell inside a store, optionally namespaced
//! - [`Scope`]: Which store a global lives in

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between namespace segments of a key
pub const KEY_SEPARATOR: char = '.';

/// Key of a cell inside a store
///
/// Keys are plain strings. Callers are responsible for namespacing so that
/// unrelated purposes never share a key; [`CellKey::namespaced`] joins a
/// namespace and a name with [`KEY_SEPARATOR`].
///
/// # Examples
///
/// ```
/// use cellar_core::CellKey;
///
/// let key = CellKey::namespaced("javascript", "state");
/// assert_eq!(key.as_str(), "javascript.state");
/// assert_eq!(key.namespace(), Some("javascript"));
/// assert_eq!(key.name(), "state");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(String);

impl CellKey {
    /// Create a key from a raw string
    pub fn new(key: impl Into<String>) -> Self {
        CellKey(key.into())
    }

    /// Create a key `namespace.name`
    pub fn namespaced(namespace: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        CellKey(format!(
            "{}{}{}",
            namespace.as_ref(),
            KEY_SEPARATOR,
            name.as_ref()
        ))
    }

    /// Derive a sibling key by appending a suffix segment
    ///
    /// ```
    /// use cellar_core::CellKey;
    ///
    /// let key = CellKey::new("db.engine");
    /// assert_eq!(key.child("lazy").as_str(), "db.engine.lazy");
    /// ```
    pub fn child(&self, suffix: impl AsRef<str>) -> Self {
        CellKey::namespaced(&self.0, suffix)
    }

    /// Raw key string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last separator, if any
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once(KEY_SEPARATOR).map(|(ns, _)| ns)
    }

    /// Last segment of the key
    pub fn name(&self) -> &str {
        match self.0.rsplit_once(KEY_SEPARATOR) {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    /// Reject empty keys and keys with empty segments
    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::InvalidKey("key must not be empty".into()));
        }
        if self.0.split(KEY_SEPARATOR).any(str::is_empty) {
            return Err(Error::InvalidKey(format!(
                "'{}' contains an empty segment",
                self.0
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellKey {
    fn from(key: &str) -> Self {
        CellKey::new(key)
    }
}

impl From<String> for CellKey {
    fn from(key: String) -> Self {
        CellKey(key)
    }
}

impl From<&String> for CellKey {
    fn from(key: &String) -> Self {
        CellKey(key.clone())
    }
}

impl From<&CellKey> for CellKey {
    fn from(key: &CellKey) -> Self {
        key.clone()
    }
}

impl AsRef<str> for CellKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which store a global lives in
///
/// - `Application`: visible only to one application instance
/// - `Shared`: visible to every application sharing the same store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Application globals
    #[default]
    Application,
    /// Globals shared across applications
    Shared,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Application => f.write_str("application"),
            Scope::Shared => f.write_str("shared"),
        }
    }
}
