//! Concurrency Tests
//!
//! Tests for thread safety:
//! - Single winner under racing first access
//! - Read/write exclusion on guarded documents
//! - Mutual exclusion of writers
//! - Generated write sequences against concurrent readers

use crate::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const FIELDS: usize = 8;

/// Patch setting every field to `n`
fn uniform_patch(n: usize) -> Document {
    (0..FIELDS)
        .map(|f| (format!("f{}", f), json!(n)))
        .collect()
}

/// Test racing first access converges on one of the candidates
#[test]
fn test_single_winner_property() {
    const THREADS: usize = 32;

    for round in 0..20 {
        let app = create_app();
        let barrier = Arc::new(Barrier::new(THREADS));
        let key = format!("race.{}", round);

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let store = Arc::clone(app.globals());
                let barrier = Arc::clone(&barrier);
                let key = key.clone();
                thread::spawn(move || {
                    barrier.wait();
                    store.resolve(key, move || format!("candidate-{}", i)).unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winner = Arc::clone(&results[0]);
        for r in &results {
            assert!(Arc::ptr_eq(r, &winner), "callers observed different values");
        }
        let candidates: HashSet<String> = (0..THREADS).map(|i| format!("candidate-{}", i)).collect();
        assert!(candidates.contains(winner.as_str()));

        let metrics = app.globals().metrics();
        assert_eq!(metrics.initializations, 1);
        assert_eq!(
            metrics.hits + metrics.initializations + metrics.lost_races,
            THREADS as u64
        );
    }
}

/// Test racing first access to a document cell yields one document
#[test]
fn test_document_cell_first_access_race() {
    const THREADS: usize = 16;
    let app = create_app();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let cell = app.document("race.state", move || object(json!({ "origin": i })));
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut patch = Document::new();
                patch.insert(format!("t{}", i), json!(true));
                cell.merge(patch).unwrap();
                cell.document().unwrap()
            })
        })
        .collect();

    let docs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(docs.iter().all(|d| Arc::ptr_eq(d, &docs[0])));

    // Every merge landed in the single surviving document.
    let payload = docs[0].read();
    for i in 0..THREADS {
        assert_eq!(payload.get(&format!("t{}", i)), Some(&json!(true)));
    }
    assert!(payload.contains_key("origin"));
}

/// Test readers never observe a partially applied merge
#[test]
fn test_read_write_exclusion() {
    const WRITERS: usize = 4;
    const READERS: usize = 4;
    const MERGES_PER_WRITER: usize = 200;
    const READS_PER_READER: usize = 500;

    let app = create_app();
    let cell = app.document("exclusion.state", || uniform_patch(0));
    let barrier = Arc::new(Barrier::new(WRITERS + READERS));

    let mut handles = Vec::new();
    for w in 0..WRITERS {
        let cell = cell.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for m in 0..MERGES_PER_WRITER {
                cell.merge(uniform_patch(w * MERGES_PER_WRITER + m + 1)).unwrap();
            }
        }));
    }
    for _ in 0..READERS {
        let cell = cell.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..READS_PER_READER {
                let snapshot = cell.read().unwrap();
                let first = &snapshot["f0"];
                assert_eq!(snapshot.len(), FIELDS);
                assert!(
                    snapshot.values().all(|v| v == first),
                    "observed a mix of two merges: {:?}",
                    snapshot
                );
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    let guarded = cell.document().unwrap();
    assert_eq!(guarded.version(), (WRITERS * MERGES_PER_WRITER) as u64);
}

/// Test writers are mutually exclusive (no lost read-modify-write updates)
#[test]
fn test_writers_mutually_exclusive() {
    const THREADS: usize = 8;
    const INCREMENTS: usize = 250;

    let app = create_app();
    let cell = app.document("counter.state", || object(json!({"count": 0})));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cell = cell.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let doc = cell.document().unwrap();
                for _ in 0..INCREMENTS {
                    doc.with_write(|payload| {
                        let count = payload["count"].as_u64().unwrap();
                        payload.insert("count".into(), json!(count + 1));
                    });
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(
        cell.read().unwrap()["count"],
        json!((THREADS * INCREMENTS) as u64)
    );
}

/// Test shared globals converge across sibling applications
#[test]
fn test_shared_globals_across_applications() {
    const APPS: usize = 8;
    let root = create_app();
    let barrier = Arc::new(Barrier::new(APPS));

    let handles: Vec<_> = (0..APPS)
        .map(|i| {
            let app = root.sibling(format!("app-{}", i));
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                app.shared_global("engine", move || i).unwrap()
            })
        })
        .collect();

    let engines: Vec<Arc<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(engines.iter().all(|e| Arc::ptr_eq(e, &engines[0])));
    assert_eq!(root.shared_globals().len(), 1);
    assert!(root.globals().is_empty());
}

/// Readers polling a document while a writer replays a write sequence
///
/// Returns how many torn snapshots (fields from two different writes) the
/// readers observed.
fn torn_reads_during(doc: &Arc<GuardedDocument>, writes: &[(bool, usize)], readers: usize) -> usize {
    let done = Arc::new(AtomicBool::new(false));
    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let doc = Arc::clone(doc);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut torn = 0;
                loop {
                    let finished = done.load(Ordering::SeqCst);
                    let snapshot = doc.read();
                    let first = snapshot.get("f0").cloned();
                    if snapshot.len() != FIELDS || !snapshot.values().all(|v| Some(v) == first.as_ref()) {
                        torn += 1;
                    }
                    if finished {
                        return torn;
                    }
                }
            })
        })
        .collect();

    for &(replace, n) in writes {
        if replace {
            doc.replace(uniform_patch(n));
        } else {
            doc.merge(uniform_patch(n));
        }
    }
    done.store(true, Ordering::SeqCst);

    handles.into_iter().map(|h| h.join().unwrap()).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any mix of merges and replaces is observed whole by every reader
    #[test]
    fn prop_generated_writes_never_torn(
        writes in prop::collection::vec((any::<bool>(), 1usize..10_000), 1..64),
        readers in 1usize..4,
    ) {
        let doc = Arc::new(GuardedDocument::new(uniform_patch(0)));
        let torn = torn_reads_during(&doc, &writes, readers);

        prop_assert_eq!(torn, 0);
        prop_assert_eq!(doc.version(), writes.len() as u64);
        let last = json!(writes[writes.len() - 1].1);
        prop_assert_eq!(doc.get("f0"), Some(last));
    }
}
