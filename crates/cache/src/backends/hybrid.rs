//! Memory tier in front of a disk tier

use super::{DiskCache, MemoryCache};
use crate::config::CacheConfig;
use crate::errors::Result;
use crate::item::CacheItem;
use crate::statistics::CacheStatistics;
use crate::traits::CacheBackend;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;

/// Metadata key marking memory copies that came from the disk tier
pub const PROMOTED_FROM: &str = "promoted_from";

/// Two-tier cache: memory for hot entries, disk for durability
///
/// Reads check memory first and fall back to disk, promoting disk hits into
/// memory with the entry's own expiry. Writes go to both tiers.
pub struct HybridCache {
    memory: MemoryCache,
    disk: DiskCache,
}

impl HybridCache {
    pub fn new(memory: MemoryCache, disk: DiskCache) -> Self {
        Self { memory, disk }
    }

    pub async fn from_config(config: &CacheConfig) -> Result<Self> {
        let disk = DiskCache::new(&config.disk.path).await?;
        Ok(Self::new(MemoryCache::from_config(config), disk))
    }

    /// The memory tier
    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    /// The disk tier
    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }
}

#[async_trait]
impl CacheBackend for HybridCache {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    async fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.memory.get(key).await {
            return Some(value);
        }

        let item = self.disk.get_item(key).await?;
        let value = item.value.clone();

        // The promoted copy keeps the disk record's expiry
        match self.memory.insert_item(item.with_metadata(PROMOTED_FROM, "disk")) {
            Ok(()) => tracing::debug!(key, "hybrid cache: disk hit, promoted to memory"),
            Err(e) => tracing::warn!(key, error = %e, "hybrid cache: promotion failed"),
        }

        Some(value)
    }

    async fn set_with_type(
        &self,
        key: &str,
        value: Value,
        item_type: &str,
        ttl: Duration,
    ) -> Result<()> {
        // One item for both tiers so their timestamps agree
        let item = CacheItem::new(key, value, item_type, ttl);
        self.disk.insert_item(&item).await?;
        self.memory.insert_item(item)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.memory.delete(key).await?;
        self.disk.delete(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.memory.clear().await?;
        self.disk.clear().await
    }

    async fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.memory.keys().await.into_iter().collect();
        keys.extend(self.disk.keys().await);
        keys.into_iter().collect()
    }

    async fn stats(&self) -> CacheStatistics {
        let memory = self.memory.stats().await;
        let disk = self.disk.stats().await;

        let mut combined = memory.combine(&disk);
        // Writes go to both tiers, so disk already holds every memory entry
        combined.total_entries = memory.total_entries.max(disk.total_entries);
        combined
    }

    async fn expire_sweep(&self) -> Result<u64> {
        let from_memory = self.memory.expire_sweep().await?;
        let from_disk = self.disk.expire_sweep().await?;
        Ok(from_memory + from_disk)
    }

    async fn close(&self) -> Result<()> {
        self.memory.close().await?;
        self.disk.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn hybrid(temp_dir: &TempDir) -> HybridCache {
        let config = CacheConfig::hybrid(temp_dir.path());
        HybridCache::from_config(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_write_through() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;

        cache.set("k", json!("v"), Duration::from_secs(3600)).await.unwrap();

        assert!(cache.memory().peek("k").is_some());
        assert!(cache.disk().entry_path("k").exists());
        assert_eq!(cache.get("k").await, Some(json!("v")));
    }

    #[tokio::test]
    async fn test_disk_fallback_promotes_into_memory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;

        cache.set("k", json!("v"), Duration::from_secs(3600)).await.unwrap();
        let original = cache.disk().get_item("k").await.unwrap();

        cache.memory().delete("k").await.unwrap();
        assert!(cache.memory().peek("k").is_none());

        assert_eq!(cache.get("k").await, Some(json!("v")));
        assert_eq!(cache.memory().get("k").await, Some(json!("v")));

        let promoted = cache.memory().peek("k").unwrap();
        assert_eq!(promoted.expires_at, original.expires_at);
        assert!(promoted.expires_at <= original.created_at + chrono::Duration::hours(1));
        assert_eq!(
            promoted.metadata.get(PROMOTED_FROM).map(String::as_str),
            Some("disk")
        );
    }

    #[tokio::test]
    async fn test_written_items_are_not_marked_promoted() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;

        cache.set("k", json!("v"), Duration::from_secs(60)).await.unwrap();
        assert!(cache.memory().peek("k").unwrap().metadata.is_empty());

        let on_disk = cache.disk().get_item("k").await.unwrap();
        assert!(!on_disk.metadata.contains_key(PROMOTED_FROM));
    }

    #[tokio::test]
    async fn test_miss_in_both_tiers() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;

        assert_eq!(cache.get("nope").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.total_misses, 2);
        assert_eq!(stats.miss_ratio, 1.0);
    }

    #[tokio::test]
    async fn test_stats_are_weighted_by_counts() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;
        let ttl = Duration::from_secs(60);

        cache.set("k", json!(1), ttl).await.unwrap();
        cache.get("k").await; // memory hit

        cache.memory().delete("k").await.unwrap();
        cache.get("k").await; // memory miss, disk hit
        cache.get("absent").await; // memory miss, disk miss

        let memory = cache.memory().stats().await;
        let disk = cache.disk().stats().await;
        let combined = cache.stats().await;

        assert_eq!(combined.total_hits, memory.total_hits + disk.total_hits);
        assert_eq!(combined.total_misses, memory.total_misses + disk.total_misses);
        let expected = combined.total_hits as f64 / combined.total_lookups() as f64;
        assert!((combined.hit_ratio - expected).abs() < 1e-12);
        assert!((combined.hit_ratio + combined.miss_ratio - 1.0).abs() < 1e-12);
        assert_eq!(combined.total_entries, 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear_hit_both_tiers() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;
        let ttl = Duration::from_secs(60);

        cache.set("a", json!(1), ttl).await.unwrap();
        cache.set("b", json!(2), ttl).await.unwrap();

        cache.delete("a").await.unwrap();
        assert_eq!(cache.get("a").await, None);
        assert!(!cache.disk().entry_path("a").exists());

        cache.clear().await.unwrap();
        assert!(cache.keys().await.is_empty());
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test]
    async fn test_keys_are_deduplicated() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;
        let ttl = Duration::from_secs(60);

        cache.set("a", json!(1), ttl).await.unwrap();
        cache.set("b", json!(2), ttl).await.unwrap();
        cache.memory().delete("b").await.unwrap();

        assert_eq!(cache.keys().await, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_expired_disk_entry_is_not_promoted() {
        let temp_dir = TempDir::new().unwrap();
        let cache = hybrid(&temp_dir).await;

        cache.set("k", json!(1), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.expire_sweep().await.unwrap(), 2);
        assert_eq!(cache.get("k").await, None);
        assert!(cache.memory().is_empty());
    }
}
