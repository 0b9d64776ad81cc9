//! Invalidation hooks for write paths.
//!
//! Each resource family owns an API root; invalidating the family drops every
//! cached GET under that root, list and detail views alike. Failures are
//! reported and swallowed so the write that triggered them still succeeds.

use actix_web::http::Method;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::cache::{
    policy::cache_key,
    stats::{CacheOp, CacheStats},
    store::{CacheStore, bounded},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceFamily {
    pub name: &'static str,
    pub api_root: &'static str,
}

impl ResourceFamily {
    pub const PROPERTIES: ResourceFamily = ResourceFamily::new("properties", "/api/properties");
    pub const BLOG: ResourceFamily = ResourceFamily::new("blog", "/api/blog");
    pub const USERS: ResourceFamily = ResourceFamily::new("users", "/api/users");
    pub const LOCATIONS: ResourceFamily = ResourceFamily::new("locations", "/api/locations");

    pub const fn new(name: &'static str, api_root: &'static str) -> Self {
        Self { name, api_root }
    }

    /// Prefix shared by every cache key of this family.
    pub fn key_prefix(&self) -> String {
        cache_key(&Method::GET, self.api_root)
    }
}

#[derive(Clone)]
pub struct CacheInvalidator {
    store: Arc<dyn CacheStore>,
    stats: Arc<CacheStats>,
    generation: Arc<AtomicU64>,
    store_timeout: Duration,
}

impl CacheInvalidator {
    pub(crate) fn new(
        store: Arc<dyn CacheStore>,
        stats: Arc<CacheStats>,
        generation: Arc<AtomicU64>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            stats,
            generation,
            store_timeout,
        }
    }

    /// Drop every cached entry of `family`. Idempotent and infallible for the caller.
    pub async fn invalidate_family(&self, family: &ResourceFamily) {
        // Bump first so misses already in flight do not write back what we are about to drop.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.stats.record_invalidation();

        let prefix = family.key_prefix();
        match bounded(self.store_timeout, self.store.delete_matching(&prefix)).await {
            Ok(removed) => {
                log::debug!(
                    "Invalidated {} cached responses for {} ({})",
                    removed,
                    family.name,
                    prefix
                );
            }
            Err(e) => self.stats.report_fault(CacheOp::Invalidate, &prefix, &e),
        }
    }

    pub async fn invalidate_properties(&self) {
        self.invalidate_family(&ResourceFamily::PROPERTIES).await;
    }

    pub async fn invalidate_blog(&self) {
        self.invalidate_family(&ResourceFamily::BLOG).await;
    }

    pub async fn invalidate_users(&self) {
        self.invalidate_family(&ResourceFamily::USERS).await;
    }

    pub async fn invalidate_locations(&self) {
        self.invalidate_family(&ResourceFamily::LOCATIONS).await;
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
