//! Redis-backed cache store, for deployments where analysis results must
//! survive process restarts or be shared between replicas.

use crate::store::{CacheEntry, CacheStore};
use async_trait::async_trait;
use funnel_core::{FunnelError, FunnelResult};
use redis::AsyncCommands;
use tracing::info;

pub struct RedisStore {
    client: redis::Client,
    /// Server-side expiry, a backstop behind the cache layer's own TTL check.
    ttl_secs: u64,
}

impl RedisStore {
    /// Connect and verify reachability.
    pub async fn connect(url: &str, ttl_secs: u64) -> FunnelResult<Self> {
        info!(url = %url, "connecting to Redis cache store");

        let client = redis::Client::open(url).map_err(unavailable)?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        info!(response = %pong, "Redis connection established");

        Ok(Self { client, ttl_secs })
    }

    fn storage_key(key: &str) -> String {
        format!("funnel:analysis:{key}")
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> FunnelResult<Option<CacheEntry>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        let data: Option<String> = conn
            .get(Self::storage_key(key))
            .await
            .map_err(unavailable)?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> FunnelResult<()> {
        let json = serde_json::to_string(&entry)?;
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        conn.set_ex::<_, _, ()>(Self::storage_key(key), json, self.ttl_secs)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> FunnelResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        conn.del::<_, ()>(Self::storage_key(key))
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: redis::RedisError) -> FunnelError {
    FunnelError::CacheUnavailable(err.to_string())
}
