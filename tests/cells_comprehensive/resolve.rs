//! Resolve Tests
//!
//! Sequential behavior of lazy resolution:
//! - Idempotence (default computed once)
//! - Explicit overwrite and removal
//! - Failed initialization
//! - Typed access

use crate::*;
use cellar::{Error, ResolveError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_resolve_twice_computes_once() {
    let app = create_app();
    let calls = AtomicUsize::new(0);
    let compute = || {
        calls.fetch_add(1, Ordering::SeqCst);
        vec!["Coraline".to_string()]
    };

    let first = app.global("javascript.characters", compute).unwrap();
    let second = app.global("javascript.characters", compute).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_set_is_visible_to_later_resolves() {
    let app = create_app();
    app.global("python.state", || 1i32).unwrap();
    app.set_global("python.state", 2i32).unwrap();
    assert_eq!(*app.global("python.state", || 3i32).unwrap(), 2);
    assert_eq!(app.globals().metrics().overwrites, 1);
}

#[test]
fn test_remove_reinitializes() {
    let app = create_app();
    app.global("ruby.state", || "old".to_string()).unwrap();
    assert!(app.globals().remove("ruby.state"));
    assert_eq!(*app.global("ruby.state", || "new".to_string()).unwrap(), "new");
}

#[test]
fn test_failed_initialization_does_not_corrupt_store() {
    let app = create_app();
    let store = app.globals();

    let result = store.try_resolve("db.engine", || Err::<String, _>("database unreachable"));
    assert!(matches!(result, Err(ResolveError::Init("database unreachable"))));
    assert!(!store.contains("db.engine"));

    let engine = store
        .try_resolve("db.engine", || Ok::<_, &str>("engine".to_string()))
        .unwrap();
    assert_eq!(*engine, "engine");
    assert_eq!(store.metrics().failed_initializations, 1);
    assert_eq!(store.metrics().initializations, 1);
}

#[test]
fn test_wrong_type_is_reported() {
    let app = create_app();
    app.global("php.state", || 0u16).unwrap();
    let err = app.global("php.state", String::new).unwrap_err();
    match err {
        Error::WrongType { key, expected } => {
            assert_eq!(key, "php.state");
            assert!(expected.contains("String"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_invalid_key() {
    let app = create_app();
    assert!(matches!(app.global("", || 0u8), Err(Error::InvalidKey(_))));
    assert!(matches!(app.global("a..b", || 0u8), Err(Error::InvalidKey(_))));
}

#[test]
fn test_namespaced_keys() {
    let app = create_app();
    app.global(CellKey::namespaced("javascript", "state"), || 0u8).unwrap();
    app.global(CellKey::namespaced("javascript", "stateLock"), || 0u8).unwrap();
    app.global(CellKey::namespaced("python", "state"), || 0u8).unwrap();

    let keys = app.globals().keys_in("javascript");
    assert_eq!(
        keys,
        vec![CellKey::new("javascript.state"), CellKey::new("javascript.stateLock")]
    );
}
