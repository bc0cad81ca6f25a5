#![warn(clippy::unwrap_used)]

//! Analysis result cache keyed by deterministic fingerprints, with TTL
//! expiry checked lazily at lookup and a single-flight guarantee for
//! concurrent same-key computations.

pub mod clock;
pub mod fingerprint;
mod flight;
pub mod memory;
pub mod redis;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use fingerprint::{fingerprint, KeyInputs};
pub use memory::{CacheStats, MemoryStore};
pub use redis::RedisStore;
pub use store::{CacheEntry, CacheStore};

use chrono::Duration;
use flight::SingleFlight;
use funnel_core::config::CacheConfig;
use funnel_core::FunnelResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a cache-mediated computation. Hit/miss is part of the contract
/// so callers can account for the cost saving, not a side log.
#[derive(Debug, Clone)]
pub struct CacheOutcome<T> {
    pub payload: T,
    pub cache_used: bool,
    pub cache_key: String,
}

/// Memoizes expensive analysis payloads per fingerprint. Explicitly
/// constructed with its store and clock injected; never a process-wide
/// singleton, so tests control time and isolate state.
pub struct FingerprintCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    rate_precision: u32,
    flight: SingleFlight,
}

impl FingerprintCache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>, config: &CacheConfig) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::seconds(config.ttl_secs as i64),
            rate_precision: config.rate_precision,
            flight: SingleFlight::new(),
        }
    }

    /// Return the live cached payload for `inputs`, or invoke `compute`
    /// exactly once, store its result, and return it.
    ///
    /// The per-key lock spans the whole lookup-compute-store section, so
    /// concurrent callers with the same fingerprint cannot both compute.
    /// A store failure downgrades to direct computation: the caller still
    /// gets a correct result, only the cost saving is lost.
    pub async fn get_or_compute<T, F>(
        &self,
        inputs: &KeyInputs,
        compute: F,
    ) -> FunnelResult<CacheOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> FunnelResult<T>,
    {
        let key = fingerprint(inputs, self.rate_precision);
        let _guard = self.flight.acquire(&key).await;

        match self.store.get(&key).await {
            Ok(Some(entry)) => {
                if self.clock.now() - entry.computed_at <= self.ttl {
                    metrics::counter!("cache.hit").increment(1);
                    debug!(key = %short_key(&key), "cache hit");
                    let payload = serde_json::from_value(entry.payload)?;
                    return Ok(CacheOutcome {
                        payload,
                        cache_used: true,
                        cache_key: key,
                    });
                }
                metrics::counter!("cache.expired").increment(1);
                debug!(key = %short_key(&key), "cache entry expired");
                if let Err(error) = self.store.remove(&key).await {
                    warn!(error = %error, "failed to evict expired cache entry");
                }
            }
            Ok(None) => {
                metrics::counter!("cache.miss").increment(1);
                debug!(key = %short_key(&key), "cache miss");
            }
            Err(error) => {
                metrics::counter!("cache.unavailable").increment(1);
                warn!(error = %error, "cache backend unavailable, computing directly");
                let payload = compute()?;
                return Ok(CacheOutcome {
                    payload,
                    cache_used: false,
                    cache_key: key,
                });
            }
        }

        let payload = compute()?;
        let entry = CacheEntry {
            payload: serde_json::to_value(&payload)?,
            computed_at: self.clock.now(),
        };
        if let Err(error) = self.store.put(&key, entry).await {
            warn!(error = %error, "failed to store cache entry");
        }
        Ok(CacheOutcome {
            payload,
            cache_used: false,
            cache_key: key,
        })
    }
}

/// First eight hex chars, enough to correlate log lines per fingerprint.
fn short_key(key: &str) -> &str {
    &key[..key.len().min(8)]
}

// ─── Tests ──────────────────────────────────────────────────────────────────
