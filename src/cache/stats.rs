//! Counters for the response cache and the single hook every swallowed
//! store failure goes through.

use serde::Serialize;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::cache::store::StoreError;

/// Store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Get,
    Set,
    Invalidate,
}

impl fmt::Display for CacheOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheOp::Get => write!(f, "get"),
            CacheOp::Set => write!(f, "set"),
            CacheOp::Invalidate => write!(f, "invalidate"),
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
    writes: AtomicU64,
    stale_writes_skipped: AtomicU64,
    invalidations: AtomicU64,
    get_failures: AtomicU64,
    set_failures: AtomicU64,
    invalidate_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub bypassed: u64,
    pub writes: u64,
    pub stale_writes_skipped: u64,
    pub invalidations: u64,
    pub get_failures: u64,
    pub set_failures: u64,
    pub invalidate_failures: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a store failure that was swallowed so the request could carry on.
    pub fn report_fault(&self, op: CacheOp, key: &str, error: &StoreError) {
        let counter = match op {
            CacheOp::Get => &self.get_failures,
            CacheOp::Set => &self.set_failures,
            CacheOp::Invalidate => &self.invalidate_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        log::warn!("Cache {} failed for '{}': {}", op, key, error);
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_write_skipped(&self) {
        self.stale_writes_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            stale_writes_skipped: self.stale_writes_skipped.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            get_failures: self.get_failures.load(Ordering::Relaxed),
            set_failures: self.set_failures.load(Ordering::Relaxed),
            invalidate_failures: self.invalidate_failures.load(Ordering::Relaxed),
        }
    }
}
