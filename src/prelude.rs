//! Convenient imports for Cellar.
//!
//! ```
//! use cellar::prelude::*;
//!
//! let app = Cellar::new("my-app");
//! let state = app.document("my-app.state", Document::new);
//! state.merge_value(json!({"ready": true})).unwrap();
//! ```

// Main entry point
pub use crate::context::{Cellar, CellarBuilder, CellarConfig};

// Error handling
pub use crate::error::{Error, Result};

// Cells and documents
pub use crate::resource::StateResource;
pub use cellar_core::{CellKey, Scope};
pub use cellar_primitives::{Document, DocumentCell, GuardedDocument};
pub use cellar_storage::{ConfiguredEntry, LazyEntry, LazyList, LazyMap, SharedStore, Singleton};

// Re-export serde_json for convenience
pub use serde_json::json;
