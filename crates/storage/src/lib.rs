//! Storage layer for Cellar
//!
//! This crate implements the shared cell store and its lazy helpers:
//! - SharedStore: DashMap-backed keyed cells with race-safe lazy resolution
//! - LazyEntry / LazyMap / LazyList: resettable double-checked lazy instances,
//!   optionally wrapped around configurations stored in a SharedStore
//! - Singleton: mutex-guarded one-time fallible initialization
//! - StoreMetrics: resolution counters
//! - StoreConfig: store sizing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod lazy;
pub mod metrics;
pub mod singleton;
pub mod store;

pub use config::StoreConfig;
pub use lazy::{ConfiguredEntry, Fetched, LazyEntry, LazyList, LazyMap, LAZY_SUFFIX};
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use singleton::Singleton;
pub use store::{CellValue, ResolveError, SharedStore};
