//! Bounded in-memory backend with cost-based admission

use crate::config::CacheConfig;
use crate::errors::{CacheError, Result, StoreType};
use crate::eviction::{EvictionPolicy, LfuPolicy};
use crate::item::CacheItem;
use crate::statistics::{bytes_to_mb, CacheStatistics, StatsCounters};
use crate::traits::CacheBackend;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// In-memory cache bounded by total cost and entry count
///
/// The cost of an entry is its serialized size. Entries are expired lazily on
/// read or by [`CacheBackend::expire_sweep`].
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheItem>>,
    policy: LfuPolicy,
    stats: StatsCounters,
    closed: AtomicBool,
}

impl MemoryCache {
    pub fn new(max_cost_bytes: u64, max_entries: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy: LfuPolicy::new(max_cost_bytes, max_entries),
            stats: StatsCounters::default(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_cost_bytes(), config.max_entries)
    }

    /// Admit a fully built item, keeping its timestamps
    ///
    /// Used for promotion from slower tiers so the copy expires exactly when
    /// the original does. An item that does not fit the budget on its own is
    /// rejected and counted as evicted; that is not an error.
    pub fn insert_item(&self, item: CacheItem) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::closed(StoreType::Memory));
        }

        let cost = item.estimated_size();
        let mut entries = self.entries.write();

        if entries.remove(&item.key).is_some() {
            self.policy.on_remove(&item.key);
        }

        if cost > self.policy.max_cost() {
            self.stats.record_evicted(1);
            tracing::debug!(key = %item.key, cost, "memory cache rejected oversized entry");
            return Ok(());
        }

        let now = Utc::now();
        while let Some(victim) = self.policy.next_eviction(cost) {
            self.policy.on_remove(&victim);
            match entries.remove(&victim) {
                Some(old) if old.is_expired_at(now) => self.stats.record_expired(1),
                Some(_) => {
                    self.stats.record_evicted(1);
                    tracing::debug!(key = %victim, "memory cache evicted entry");
                }
                None => {}
            }
        }

        self.policy.on_insert(&item.key, cost);
        entries.insert(item.key.clone(), item);
        Ok(())
    }

    /// Look at an entry without touching its access bookkeeping
    pub fn peek(&self, key: &str) -> Option<CacheItem> {
        self.entries
            .read()
            .get(key)
            .filter(|item| !item.is_expired())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Option<Value> {
        if self.closed.load(Ordering::Acquire) {
            self.stats.record_miss();
            return None;
        }

        let mut entries = self.entries.write();
        let expired = match entries.get(key) {
            Some(item) => item.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            entries.remove(key);
            self.policy.on_remove(key);
            self.stats.record_expired_miss();
            tracing::debug!(key, "memory cache entry expired");
            return None;
        }

        let item = entries.get_mut(key)?;
        item.touch();
        self.policy.on_access(key);
        self.stats.record_hit();
        Some(item.value.clone())
    }

    async fn set_with_type(
        &self,
        key: &str,
        value: Value,
        item_type: &str,
        ttl: Duration,
    ) -> Result<()> {
        self.insert_item(CacheItem::new(key, value, item_type, ttl))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::closed(StoreType::Memory));
        }

        if self.entries.write().remove(key).is_some() {
            self.policy.on_remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::closed(StoreType::Memory));
        }

        let mut entries = self.entries.write();
        entries.clear();
        self.policy.clear();
        self.stats.reset();
        Ok(())
    }

    async fn keys(&self) -> Vec<String> {
        let now = Utc::now();
        self.entries
            .read()
            .values()
            .filter(|item| !item.is_expired_at(now))
            .map(|item| item.key.clone())
            .collect()
    }

    async fn stats(&self) -> CacheStatistics {
        let entries = self.entries.read();
        let mut stats = self.stats.snapshot();
        stats.total_entries = entries.len() as u64;
        stats.memory_usage_mb = bytes_to_mb(self.policy.memory_usage());
        stats
    }

    async fn expire_sweep(&self) -> Result<u64> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let expired: Vec<String> = entries
            .values()
            .filter(|item| item.is_expired_at(now))
            .map(|item| item.key.clone())
            .collect();

        for key in &expired {
            entries.remove(key);
            self.policy.on_remove(key);
        }

        let removed = expired.len() as u64;
        self.stats.record_expired(removed);
        Ok(removed)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.entries.write().clear();
        self.policy.clear();
        Ok(())
    }
}
