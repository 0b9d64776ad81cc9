//! Response caching layer: store abstraction, per-request policy,
//! write-path invalidation, and the shared handle the middleware runs on.

pub mod invalidation;
pub mod policy;
pub mod stats;
pub mod store;

pub use invalidation::{CacheInvalidator, ResourceFamily};
pub use policy::{CacheDecision, CachePolicy, ListRoute, RouteCacheRules};
pub use stats::{CacheOp, CacheStats, CacheStatsSnapshot};
pub use store::{CacheStore, CachedResponse, MemoryStore, StoreError};

use actix_web::http::Method;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::config::CacheConfig;
use store::bounded;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// Everything the cache middleware and the invalidator share.
///
/// The store is injected here and nowhere else; `main` owns its lifetime.
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    policy: Arc<CachePolicy>,
    stats: Arc<CacheStats>,
    generation: Arc<AtomicU64>,
    store_timeout: Duration,
    enabled: bool,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>, policy: CachePolicy) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
            stats: Arc::new(CacheStats::new()),
            generation: Arc::new(AtomicU64::new(1)),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            enabled: true,
        }
    }

    /// In-memory layer sized and timed from configuration.
    pub fn from_config(config: &CacheConfig, policy: CachePolicy) -> Self {
        let store = MemoryStore::new(config.max_capacity, policy.max_ttl());

        Self::new(Arc::new(store), policy)
            .with_store_timeout(config.store_timeout)
            .with_enabled(config.enabled)
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn invalidator(&self) -> CacheInvalidator {
        CacheInvalidator::new(
            self.store.clone(),
            self.stats.clone(),
            self.generation.clone(),
            self.store_timeout,
        )
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn decide(&self, method: &Method, path_and_query: &str) -> CacheDecision {
        if !self.enabled {
            return CacheDecision::Bypass;
        }
        self.policy.resolve(method, path_and_query)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Look up `key`; any store failure reads as a miss.
    pub(crate) async fn lookup(&self, key: &str) -> Option<CachedResponse> {
        match bounded(self.store_timeout, self.store.get(key)).await {
            Ok(found) => found,
            Err(e) => {
                self.stats.report_fault(CacheOp::Get, key, &e);
                None
            }
        }
    }

    /// Write a freshly computed response unless an invalidation ran since
    /// `generation` was read. Failures are reported and dropped.
    pub(crate) async fn populate(
        &self,
        key: &str,
        response: CachedResponse,
        ttl: Duration,
        generation: u64,
    ) {
        if self.generation() != generation {
            log::debug!("Skipping cache write for {}: invalidated while computing", key);
            self.stats.record_stale_write_skipped();
            return;
        }

        match bounded(self.store_timeout, self.store.set(key, response, ttl)).await {
            Ok(()) => self.stats.record_write(),
            Err(e) => self.stats.report_fault(CacheOp::Set, key, &e),
        }
    }
}
