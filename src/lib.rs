//! # Cellar
//!
//! Race-safe lazily-initialized shared cells and reader/writer guarded
//! documents.
//!
//! Cellar stores small pieces of per-application state (a state document,
//! a lock, a connection engine) in a keyed store that many threads hit at
//! once. The first completed initialization of a key wins and every racing
//! caller adopts it.
//!
//! ## Quick Start
//!
//! ```
//! use cellar::prelude::*;
//!
//! let app = Cellar::new("prudence-example");
//!
//! // Lazily-created global, identical for every caller
//! let counter = app.global("visits", || std::sync::atomic::AtomicU64::new(0)).unwrap();
//! counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!
//! // Guarded JSON document behind GET/POST/PUT/DELETE handlers
//! let resource = app.state_resource("javascript", Document::new);
//! resource.handle_post(r#"{"rating": "A"}"#).unwrap();
//! assert_eq!(resource.handle_get().unwrap(), r#"{"rating":"A"}"#);
//! ```
//!
//! ## Building Blocks
//!
//! - [`SharedStore`] - keyed cells with compute-then-insert-if-absent
//! - [`GuardedDocument`] - JSON object behind a reader/writer lock
//! - [`DocumentCell`] - guarded document resolved from a store
//! - [`LazyEntry`] / [`LazyMap`] / [`LazyList`] - resettable lazy instances
//! - [`Singleton`] - blocking one-time fallible initialization
//! - [`Cellar`] - application and shared globals
//! - [`StateResource`] - JSON handlers over a state document

#![warn(missing_docs)]

mod context;
mod error;
mod resource;

pub mod prelude;

// Re-export main entry points
pub use context::{Cellar, CellarBuilder, CellarConfig};
pub use error::{Error, Result};
pub use resource::{StateResource, MEDIA_TYPES};

// Re-export building blocks
pub use cellar_core::{CellKey, Scope};
pub use cellar_primitives::{Document, DocumentCell, GuardedDocument};
pub use cellar_storage::{
    ConfiguredEntry, Fetched, LazyEntry, LazyList, LazyMap, MetricsSnapshot, ResolveError,
    SharedStore, Singleton, StoreConfig,
};
