//! Primitives for Cellar
//!
//! - [`GuardedDocument`]: JSON object behind a reader/writer lock
//! - [`DocumentCell`]: guarded document resolved lazily from a shared store
//!
//! ## Thread Safety
//!
//! Both types are `Send + Sync`. A `DocumentCell` is cheap to clone and can
//! be handed to every request handler; they all reach the same document.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell;
pub mod document;

pub use cell::DocumentCell;
pub use document::{into_object, Document, GuardedDocument};
