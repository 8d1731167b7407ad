//! Core types for Cellar
//!
//! This crate holds the types every other crate in the workspace agrees on:
//! - [`CellKey`]: address of a cell inside a store
//! - [`Scope`]: application-local or shared globals
//! - [`Error`] / [`Result`]: error type for cell and document operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{CellKey, Scope, KEY_SEPARATOR};
