//! Document cache with LRU eviction and TTL expiration.
//!
//! Holds loaded remote documents (mostly contexts) keyed by the URL they
//! were requested under:
//! - Maximum entry count (LRU eviction)
//! - Time-to-live expiration per entry

use jsonld_core::RemoteDocument;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

struct CacheEntry {
    document: Arc<RemoteDocument>,
    inserted_at: Instant,
}

/// LRU cache of remote documents with TTL expiration.
pub struct DocumentCache {
    inner: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl DocumentCache {
    /// Create a cache holding at most `max_entries` documents (at least one)
    /// for `ttl` each.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(LruCache::new(capacity)),
            ttl,
        }
    }

    // Entries stay valid after a panic under the lock; poison is ignored.
    fn write(&self) -> RwLockWriteGuard<'_, LruCache<String, CacheEntry>> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("document cache lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<String, CacheEntry>> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("document cache lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Get a document if present and not expired.
    ///
    /// Expired entries are removed on access.
    pub fn get(&self, url: &str) -> Option<Arc<RemoteDocument>> {
        let mut cache = self.write();

        if let Some(entry) = cache.get(url) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.document.clone());
            }
            cache.pop(url);
            tracing::trace!(url, "evicted expired document");
        }

        None
    }

    /// Insert a document; the least recently used entry is evicted when the
    /// cache is full.
    pub fn insert(&self, url: impl Into<String>, document: Arc<RemoteDocument>) {
        self.write().put(
            url.into(),
            CacheEntry {
                document,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, url: &str) -> Option<Arc<RemoteDocument>> {
        self.write().pop(url).map(|entry| entry.document)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
