//! Key-value store behind the response cache.
//!
//! The interceptor and the invalidator only ever talk to [`CacheStore`]; the
//! bundled [`MemoryStore`] keeps entries in process memory on top of moka.
//! Any other backend (a networked cache, a test double) plugs in by
//! implementing the trait.

use actix_web::{
    HttpResponse,
    body::BoxBody,
    http::{StatusCode, header::HeaderMap},
    web::Bytes,
};
use async_trait::async_trait;
use moka::future::Cache;
use std::{future::Future, time::Duration};
use thiserror::Error;
use tokio::time::Instant;

/// Snapshot of a successful response, as it was sent to the first client.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Rebuild an HTTP response carrying exactly the captured status, headers and body.
    pub fn to_http_response(&self) -> HttpResponse<BoxBody> {
        let mut res = HttpResponse::with_body(self.status, self.body.clone());
        *res.headers_mut() = self.headers.clone();
        res.map_into_boxed_body()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("cache store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Operations the cache layer needs from a key-value backend.
///
/// Every method may fail; callers treat failures as misses or no-ops.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, StoreError>;

    async fn set(&self, key: &str, value: CachedResponse, ttl: Duration)
    -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Delete every entry whose key falls under `prefix` (see [`key_matches_prefix`]).
    /// Returns how many entries were dropped.
    async fn delete_matching(&self, prefix: &str) -> Result<u64, StoreError>;
}

/// Prefix test used for invalidation.
///
/// The prefix must end on a path segment boundary in the key: `GET:/api/users`
/// covers `GET:/api/users`, `GET:/api/users/42` and `GET:/api/users?page=2`
/// but not `GET:/api/users-archive`.
pub fn key_matches_prefix(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

/// Run a store call under `limit`, turning an elapsed deadline into [`StoreError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

//============================================================================
// In-process store
//============================================================================

#[derive(Clone)]
struct StoredEntry {
    response: CachedResponse,
    expires_at: Instant,
}

/// In-process store backed by a moka cache.
///
/// moka's own `time_to_live` is set to the longest TTL the policy hands out
/// and only reclaims memory; the per-entry deadline is checked on read.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, StoredEntry>,
}

impl MemoryStore {
    pub fn new(max_capacity: u64, max_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(max_ttl)
            .build();
        Self { cache }
    }

    pub async fn contains(&self, key: &str) -> bool {
        matches!(self.get(key).await, Ok(Some(_)))
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, StoreError> {
        let Some(entry) = self.cache.get(key).await else {
            return Ok(None);
        };

        if Instant::now() >= entry.expires_at {
            self.cache.invalidate(key).await;
            return Ok(None);
        }

        Ok(Some(entry.response))
    }

    async fn set(
        &self,
        key: &str,
        value: CachedResponse,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let entry = StoredEntry {
            response: value,
            expires_at: Instant::now() + ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_matching(&self, prefix: &str) -> Result<u64, StoreError> {
        let doomed: Vec<_> = self
            .cache
            .iter()
            .filter(|(key, _)| key_matches_prefix(key, prefix))
            .map(|(key, _)| key)
            .collect();

        for key in &doomed {
            self.cache.invalidate(key.as_str()).await;
        }

        Ok(doomed.len() as u64)
    }
}
