// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring cache backends for quota counters and idempotency records.
//!
//! [`MemoryCache`] keeps entries in a process-local [`DashMap`]. It is only
//! correct when a single gateway process serves all traffic; deployments
//! with several gateways use the SQLite cache from `smsgate-storage`.
//!
//! [`spawn_purge_task`] sweeps expired entries from any [`ExpiringCache`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use smsgate_core::{AdapterType, ExpiringCache, HealthStatus, PluginAdapter, SmsgateError};

/// Expiry used when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Shortest sweep period the purge task will run at.
const MIN_PURGE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { value, expires_at }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process expiring cache.
///
/// Each operation holds the shard lock for its key, so increments and
/// conditional inserts are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for MemoryCache {
    fn name(&self) -> &str {
        "memory-cache"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, SmsgateError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmsgateError> {
        self.entries.clear();
        Ok(())
    }
}

#[async_trait]
impl ExpiringCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, SmsgateError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Option<String>, SmsgateError> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(existing) if existing.get().is_live(now) => {
                Ok(Some(existing.get().value.clone()))
            }
            Entry::Occupied(mut expired) => {
                expired.insert(CacheEntry::new(value.to_string(), ttl));
                Ok(None)
            }
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new(value.to_string(), ttl));
                Ok(None)
            }
        }
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, SmsgateError> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut counter) if counter.get().is_live(now) => {
                let current: i64 = counter.get().value.parse().map_err(|_| SmsgateError::Cache {
                    message: format!("value at `{key}` is not a counter"),
                    source: None,
                })?;
                let next = current + 1;
                counter.get_mut().value = next.to_string();
                Ok(next)
            }
            Entry::Occupied(mut expired) => {
                expired.insert(CacheEntry::new("1".to_string(), ttl));
                Ok(1)
            }
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new("1".to_string(), ttl));
                Ok(1)
            }
        }
    }

    async fn purge_expired(&self) -> Result<u64, SmsgateError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

/// Periodically purge expired entries until `cancel` fires.
///
/// Intervals shorter than one second are raised to one second.
pub fn spawn_purge_task(
    cache: Arc<dyn ExpiringCache>,
    every: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(MIN_PURGE_INTERVAL));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match cache.purge_expired().await {
                        Ok(0) => {}
                        Ok(removed) => tracing::debug!(removed, cache = cache.name(), "purged expired cache entries"),
                        Err(e) => tracing::warn!(error = %e, cache = cache.name(), "cache purge failed"),
                    }
                }
            }
        }
        tracing::debug!("cache purge task stopped");
    })
}
