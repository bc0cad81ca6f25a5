//! Storage backend contract for cached analysis payloads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use funnel_core::FunnelResult;
use serde::{Deserialize, Serialize};

/// A cached analysis payload with its computation timestamp. Expiry is
/// decided by the cache layer against its injected clock, not by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: serde_json::Value,
    pub computed_at: DateTime<Utc>,
}

/// Key-value backend for cache entries. Implementations must be safe to
/// share across tasks; errors mean the backend is unreachable, not that a
/// key is absent.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> FunnelResult<Option<CacheEntry>>;
    async fn put(&self, key: &str, entry: CacheEntry) -> FunnelResult<()>;
    async fn remove(&self, key: &str) -> FunnelResult<()>;
}
