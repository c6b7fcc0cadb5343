// Preview Cache
//
// Session-scoped memo of query results keyed by the literal query text and branch.
// Entries live as long as the cache object; there is no TTL or size eviction.

use crate::models::{Branch, ResultTable};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Cache key: exact query text, branch and execution mode.
/// Text is not normalized, so whitespace differences are separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub branch: Branch,
    pub preview: bool,
}

impl CacheKey {
    pub fn new(query: &str, branch: &Branch, preview: bool) -> Self {
        Self {
            query: query.to_string(),
            branch: branch.clone(),
            preview,
        }
    }
}

/// Cached query result with metadata
#[derive(Debug, Clone)]
struct CachedResult {
    /// Query result data
    result: ResultTable,
    /// Number of times this cache entry was hit
    hit_count: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Entries dropped through invalidation
    pub invalidations: u64,
    /// Current number of entries
    pub entries: usize,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CachedResult>,
    stats: CacheStats,
}

/// Session-scoped query result cache
#[derive(Debug, Default)]
pub struct PreviewCache {
    state: Mutex<CacheState>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cached result, recording a hit or a miss
    pub async fn get(&self, key: &CacheKey) -> Option<ResultTable> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.entries.get_mut(key) {
            cached.hit_count += 1;
            let hit_count = cached.hit_count;
            let result = cached.result.clone();
            state.stats.hits += 1;

            tracing::debug!(
                "Cache hit on branch {} (hit_count: {})",
                key.branch,
                hit_count
            );
            return Some(result);
        }

        state.stats.misses += 1;
        tracing::debug!("Cache miss on branch {}", key.branch);
        None
    }

    /// Store query result in cache
    pub async fn put(&self, key: CacheKey, result: ResultTable) {
        let mut state = self.state.lock().await;
        let branch = key.branch.clone();
        state.entries.insert(
            key,
            CachedResult {
                result,
                hit_count: 0,
            },
        );

        tracing::debug!(
            "Cached result on branch {} (cache size: {})",
            branch,
            state.entries.len()
        );
    }

    /// Drop every entry computed against `branch`, returning how many were removed
    pub async fn invalidate_branch(&self, branch: &Branch) -> usize {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|key, _| &key.branch != branch);
        let removed = before - state.entries.len();
        state.stats.invalidations += removed as u64;

        if removed > 0 {
            tracing::info!("Invalidated {} cache entries for branch {}", removed, branch);
        }
        removed
    }

    /// Clear all cache entries
    pub async fn clear(&self) -> usize {
        let mut state = self.state.lock().await;
        let count = state.entries.len();
        state.entries.clear();
        state.stats.invalidations += count as u64;

        tracing::info!("Cleared {} cache entries", count);
        count
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.entries.len(),
            ..state.stats.clone()
        }
    }

    /// Get current cache size
    pub async fn size(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}
