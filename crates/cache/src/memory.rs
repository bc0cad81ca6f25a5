//! In-process cache store backed by DashMap for lock-free concurrent access.

use crate::store::{CacheEntry, CacheStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use funnel_core::FunnelResult;
use serde::Serialize;
use tracing::debug;

/// Bounded in-memory store. When full, the oldest quarter of entries is
/// dropped to make room, so a long-running process cannot grow without
/// limit even if expired entries are never looked up again.
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
}

/// Point-in-time store statistics for observability.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub approx_bytes: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Remove entries computed before `cutoff`. Call periodically from a
    /// maintenance task; lookup-time expiry already handles correctness.
    pub fn evict_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.computed_at >= cutoff);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "memory store eviction complete");
        }
        evicted
    }

    pub fn stats(&self) -> CacheStats {
        let approx_bytes = self
            .entries
            .iter()
            .map(|e| e.key().len() + e.value().payload.to_string().len())
            .sum();
        let timestamps: Vec<DateTime<Utc>> =
            self.entries.iter().map(|e| e.value().computed_at).collect();
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.max_entries,
            approx_bytes,
            oldest_entry: timestamps.iter().min().copied(),
            newest_entry: timestamps.iter().max().copied(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest_quarter(&self) {
        let to_remove = (self.max_entries / 4).max(1);
        let mut by_age: Vec<(String, DateTime<Utc>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().computed_at))
            .collect();
        by_age.sort_by_key(|(_, computed_at)| *computed_at);
        for (key, _) in by_age.into_iter().take(to_remove) {
            self.entries.remove(&key);
        }
        debug!(removed = to_remove, "memory store at capacity, dropped oldest entries");
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> FunnelResult<Option<CacheEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> FunnelResult<()> {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            self.evict_oldest_quarter();
        }
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> FunnelResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
