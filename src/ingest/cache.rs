//! Memoized ingestion.
//!
//! Ingestion is a pure function of `(policy, input)`, so results can be
//! cached by a hash of both. The cache is an LRU behind a read/write lock and
//! is safe to share between request handlers.
//!
//! ## Cache Key Design
//!
//! The key is an xxh64 over:
//! - the policy `params_hash`
//! - `form_id` and `form_version_id`
//! - every page number and text
//!
//! Any change to the text or the policy results in a miss.

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;
use xxhash_rust::xxh64::Xxh64;

use super::{IngestionEngine, IngestionInput, IngestionResult};

/// Configuration for the ingestion cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached results.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct IngestionCacheKey(u64);

impl IngestionCacheKey {
    fn compute(policy_hash: &str, input: &IngestionInput) -> Self {
        let mut hasher = Xxh64::new(0);
        hasher.update(policy_hash.as_bytes());
        hasher.update(&[0]);
        hasher.update(input.form_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(input.form_version_id.as_bytes());
        for page in &input.pages {
            hasher.update(&page.page_number.to_le_bytes());
            hasher.update(&(page.char_count as u64).to_le_bytes());
            hasher.update(page.text.as_bytes());
            hasher.update(&[0]);
        }
        Self(hasher.digest())
    }
}

/// Result of a cached ingestion.
#[derive(Debug, Clone)]
pub struct CachedIngestion {
    /// The ingestion result.
    pub result: Arc<IngestionResult>,
    /// Whether the result came from the cache.
    pub cache_hit: bool,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries.
    pub len: usize,
    /// Maximum capacity.
    pub cap: usize,
}

/// Ingestion engine with an optional LRU result cache.
pub struct IngestionCache {
    engine: IngestionEngine,
    policy_hash: String,
    cache: Option<RwLock<LruCache<IngestionCacheKey, Arc<IngestionResult>>>>,
}

impl IngestionCache {
    /// Wrap an engine.
    pub fn new(engine: IngestionEngine, config: CacheConfig) -> Self {
        let cache = if config.enabled {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
            Some(RwLock::new(LruCache::new(size)))
        } else {
            None
        };
        let policy_hash = engine.policy().params_hash();
        Self {
            engine,
            policy_hash,
            cache,
        }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &IngestionEngine {
        &self.engine
    }

    /// Ingest, returning a cached result when the same input was seen before.
    pub fn ingest(&self, input: &IngestionInput) -> CachedIngestion {
        let key = IngestionCacheKey::compute(&self.policy_hash, input);

        if let Some(cache) = &self.cache {
            if let Some(result) = cache.read().peek(&key) {
                tracing::trace!(
                    target: "truth_layer::ingest",
                    form_version_id = %input.form_version_id,
                    "ingestion cache hit"
                );
                return CachedIngestion {
                    result: Arc::clone(result),
                    cache_hit: true,
                };
            }
        }

        let result = Arc::new(self.engine.ingest(input));

        if let Some(cache) = &self.cache {
            cache.write().put(key, Arc::clone(&result));
        }

        CachedIngestion {
            result,
            cache_hit: false,
        }
    }

    /// Cache statistics, `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
            }
        })
    }

    /// Drop all cached results.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}
