//! Guarded Document Tests
//!
//! Merge/replace/clear semantics and lock release on failure, through
//! document cells living in application globals.

use crate::*;
use proptest::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[test]
fn test_merge_semantics() {
    let app = create_app();
    let doc = app.document("doc", || object(json!({"a": 1, "b": 2})));
    doc.merge_value(json!({"b": 3, "c": 4})).unwrap();
    assert_eq!(doc.to_value().unwrap(), json!({"a": 1, "b": 3, "c": 4}));
}

#[test]
fn test_replace_with_empty() {
    let app = create_app();
    let doc = app.document("doc", coraline);
    doc.replace(Document::new()).unwrap();
    assert_eq!(doc.to_value().unwrap(), json!({}));
    assert_eq!(doc.render().unwrap(), "{}");
}

#[test]
fn test_clear_equals_replace_empty() {
    let app = create_app();
    let doc = app.document("doc", coraline);
    doc.clear().unwrap();
    assert!(doc.read().unwrap().is_empty());
}

#[test]
fn test_lock_released_after_failed_write() {
    let app = create_app();
    let doc = app.document("doc", coraline);
    let guarded = doc.document().unwrap();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        guarded.with_write(|payload| {
            payload.insert("rating".into(), json!("F"));
            panic!("handler crashed mid-update");
        })
    }));
    assert!(outcome.is_err());

    // A read and a merge from another thread must complete promptly.
    let (tx, rx) = mpsc::channel();
    let doc2 = doc.clone();
    thread::spawn(move || {
        let before = doc2.read().unwrap();
        doc2.merge_value(json!({"rating": "A"})).unwrap();
        tx.send(before).unwrap();
    });
    let before = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("lock was not released after panic");
    // with_write mutates in place, so the partial change is visible.
    assert_eq!(before.get("rating"), Some(&json!("F")));
    assert_eq!(doc.read().unwrap().get("rating"), Some(&json!("A")));
}

#[test]
fn test_try_update_is_atomic_on_failure() {
    let app = create_app();
    let doc = app.document("doc", coraline);
    let guarded = doc.document().unwrap();

    let result: std::result::Result<(), String> = guarded.try_update(|payload| {
        payload.insert("rating".into(), json!("B"));
        payload.insert("media".into(), json!("Book"));
        Err("rejected".to_string())
    });
    assert!(result.is_err());
    assert_eq!(doc.read().unwrap(), coraline());
}

proptest! {
    #[test]
    fn merge_keeps_untouched_fields_and_applies_patch(
        base in prop::collection::btree_map("[a-e]", 0i64..100, 0..5),
        patch in prop::collection::btree_map("[a-h]", 0i64..100, 0..5),
    ) {
        let doc = GuardedDocument::new(
            base.iter().map(|(k, v)| (k.clone(), json!(v))).collect(),
        );
        doc.merge(patch.iter().map(|(k, v)| (k.clone(), json!(v))).collect());

        let merged = doc.read();
        for (k, v) in &patch {
            let expected = json!(v);
            prop_assert_eq!(merged.get(k), Some(&expected));
        }
        for (k, v) in &base {
            if !patch.contains_key(k) {
                let expected = json!(v);
                prop_assert_eq!(merged.get(k), Some(&expected));
            }
        }
        let mut expected_keys: Vec<_> = base.keys().chain(patch.keys()).cloned().collect();
        expected_keys.sort();
        expected_keys.dedup();
        prop_assert_eq!(merged.len(), expected_keys.len());
    }
}
