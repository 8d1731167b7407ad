//! Cells Comprehensive Test Suite
//!
//! End-to-end tests for the shared cell store, guarded documents and the
//! JSON state resource, exercised through the public `cellar` API.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all tests
//! cargo test --test cells_comprehensive
//!
//! # Run concurrency tests only
//! cargo test --test cells_comprehensive concurrency::
//! ```

use cellar::prelude::*;
use serde_json::Value;

// Test modules
pub mod concurrency;
pub mod documents;
pub mod resolve;
pub mod state_resource;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Install a test-writer subscriber once so `tracing` output shows on failure
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Unwrap a `json!` object literal into a document
pub fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

/// Initial state served by the example JSON resources
pub fn coraline() -> Document {
    object(json!({
        "name": "Coraline",
        "media": "Film",
        "rating": "A+",
        "characters": ["Coraline", "Wybie", "Mom", "Dad"]
    }))
}

/// Fresh application with its own stores
pub fn create_app() -> Cellar {
    init_tracing();
    Cellar::new("cells-test")
}
