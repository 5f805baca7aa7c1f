//! Process-lifetime cache of loaded and preprocessed tables
//!
//! Entries are keyed by [`SourceKey`]; the prepared table is memoised per
//! source together with the config that produced it, so asking again with a
//! different config recomputes instead of serving a stale result.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::loader::{load_source, DataSource, SourceKey, DEFAULT_INFER_SCHEMA_LENGTH};
use super::preprocess::{preprocess, PreparedTable, PreprocessConfig};

/// Default number of sources kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

struct CacheEntry {
    raw: Arc<DataFrame>,
    prepared: Option<(PreprocessConfig, Arc<PreparedTable>)>,
    last_used: u64,
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
}

/// Least-recently-used cache of source tables.
///
/// Tables are handed out behind `Arc` and never mutated, so callers may hold
/// them for as long as they like.
pub struct TableCache {
    capacity: usize,
    infer_schema_length: usize,
    entries: HashMap<SourceKey, CacheEntry>,
    tick: u64,
    stats: CacheStats,
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TableCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
            entries: HashMap::new(),
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn with_infer_schema_length(mut self, infer_schema_length: usize) -> Self {
        self.infer_schema_length = infer_schema_length;
        self
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_if_full(&mut self) {
        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    log::debug!("evicting cached table {:?}", key);
                    self.entries.remove(&key);
                    self.stats.evictions += 1;
                }
                None => break,
            }
        }
    }

    /// Raw table for a source, reading it on first use.
    ///
    /// A failed read caches nothing.
    pub fn get_or_load(&mut self, source: &DataSource) -> Result<Arc<DataFrame>> {
        let key = source.key();
        let tick = self.next_tick();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = tick;
            self.stats.hits += 1;
            log::debug!("cache hit for {}", source.display_name());
            return Ok(Arc::clone(&entry.raw));
        }

        self.stats.misses += 1;
        log::debug!("cache miss for {}", source.display_name());
        let raw = Arc::new(load_source(source, self.infer_schema_length)?);

        self.evict_if_full();
        self.entries.insert(
            key,
            CacheEntry {
                raw: Arc::clone(&raw),
                prepared: None,
                last_used: tick,
            },
        );
        Ok(raw)
    }

    /// Preprocessed table for a source, loading and preprocessing as needed.
    pub fn get_or_prepare(
        &mut self,
        source: &DataSource,
        config: &PreprocessConfig,
    ) -> Result<Arc<PreparedTable>> {
        let raw = self.get_or_load(source)?;
        let key = source.key();

        if let Some(entry) = self.entries.get(&key) {
            if let Some((cached_config, prepared)) = &entry.prepared {
                if cached_config == config {
                    return Ok(Arc::clone(prepared));
                }
            }
        }

        let prepared = Arc::new(preprocess(&raw, config)?);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.prepared = Some((config.clone(), Arc::clone(&prepared)));
        }
        Ok(prepared)
    }

    /// Drop one source; returns whether it was cached.
    pub fn invalidate(&mut self, key: &SourceKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &SourceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> DataSource {
        DataSource::upload(name, b"a,b\n1,2\n3,4\n".to_vec())
    }

    #[test]
    fn test_second_load_is_a_hit() {
        let mut cache = TableCache::new(2);
        let source = upload("a.csv");

        let first = cache.get_or_load(&source).unwrap();
        let second = cache.get_or_load(&source).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let mut cache = TableCache::new(2);
        let (a, b, c) = (upload("a.csv"), upload("b.csv"), upload("c.csv"));

        cache.get_or_load(&a).unwrap();
        cache.get_or_load(&b).unwrap();
        cache.get_or_load(&a).unwrap();
        cache.get_or_load(&c).unwrap();

        assert!(cache.contains(&a.key()));
        assert!(!cache.contains(&b.key()));
        assert!(cache.contains(&c.key()));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut cache = TableCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.get_or_load(&upload("a.csv")).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_read_is_not_cached() {
        let mut cache = TableCache::default();
        let source = DataSource::path("does/not/exist.csv");

        assert!(cache.get_or_load(&source).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = TableCache::default();
        let a = upload("a.csv");
        cache.get_or_load(&a).unwrap();

        assert!(cache.invalidate(&a.key()));
        assert!(!cache.invalidate(&a.key()));

        cache.get_or_load(&a).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
