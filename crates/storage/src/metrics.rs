//! Cell store metrics
//!
//! Lock-free counters recording how cells were resolved. Useful to confirm
//! that racing first accesses converged and how often candidates were thrown
//! away.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a [`SharedStore`](crate::SharedStore)
#[derive(Debug, Default)]
pub struct StoreMetrics {
    hits: AtomicU64,
    initializations: AtomicU64,
    lost_races: AtomicU64,
    failed_initializations: AtomicU64,
    overwrites: AtomicU64,
}

/// Point-in-time copy of [`StoreMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Resolutions served from an existing cell without computing a default
    pub hits: u64,
    /// Candidates that won the insert and became the cell value
    pub initializations: u64,
    /// Candidates computed and then discarded because another caller won
    pub lost_races: u64,
    /// Default computations that returned an error
    pub failed_initializations: u64,
    /// Explicit `set` calls
    pub overwrites: u64,
}

impl MetricsSnapshot {
    /// Total resolve calls that completed without error
    pub fn resolutions(&self) -> u64 {
        self.hits + self.initializations + self.lost_races
    }
}

impl StoreMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_initialization(&self) {
        self.initializations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lost_race(&self) {
        self.lost_races.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_initialization(&self) {
        self.failed_initializations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overwrite(&self) {
        self.overwrites.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            initializations: self.initializations.load(Ordering::Relaxed),
            lost_races: self.lost_races.load(Ordering::Relaxed),
            failed_initializations: self.failed_initializations.load(Ordering::Relaxed),
            overwrites: self.overwrites.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.initializations.store(0, Ordering::Relaxed);
        self.lost_races.store(0, Ordering::Relaxed);
        self.failed_initializations.store(0, Ordering::Relaxed);
        self.overwrites.store(0, Ordering::Relaxed);
    }
}
