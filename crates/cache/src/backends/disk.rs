//! File-per-key persistent backend
//!
//! Every entry lives in `{base_path}/{hex(sha256(key))}.cache` as the JSON
//! form of [`CacheItem`]. The original key is stored inside the file, which
//! is how [`CacheBackend::keys`] recovers it.

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp, StoreType};
use crate::item::CacheItem;
use crate::statistics::{bytes_to_mb, CacheStatistics, StatsCounters};
use crate::traits::CacheBackend;
use antoine_utils::write_atomic;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;

/// Extension of entry files
pub const CACHE_FILE_EXTENSION: &str = "cache";

/// File name holding `key`
pub fn entry_file_name(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{}.{CACHE_FILE_EXTENSION}", hex::encode(hasher.finalize()))
}

enum Loaded {
    Missing,
    Found(CacheItem),
    Unreadable(std::io::Error),
    Corrupt(serde_json::Error),
}

/// Persistent cache storing one JSON file per key
pub struct DiskCache {
    base_path: PathBuf,
    /// Serializes file mutation; reads rewrite access metadata too
    io_lock: Mutex<()>,
    stats: StatsCounters,
    closed: AtomicBool,
}

impl DiskCache {
    /// Open (creating if needed) a disk cache rooted at `base_path`
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| CacheError::Configuration {
                message: format!(
                    "cannot create cache directory {}: {e}",
                    base_path.display()
                ),
                recovery_hint: RecoveryHint::CheckPermissions {
                    path: base_path.clone(),
                },
            })?;

        tracing::debug!(path = %base_path.display(), "opened disk cache");
        Ok(Self {
            base_path,
            io_lock: Mutex::new(()),
            stats: StatsCounters::default(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file holding `key`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(entry_file_name(key))
    }

    /// Look up the full item, recording the hit or miss
    ///
    /// On a hit the access bookkeeping is persisted before returning.
    pub async fn get_item(&self, key: &str) -> Option<CacheItem> {
        if self.closed.load(Ordering::Acquire) {
            self.stats.record_miss();
            return None;
        }

        let _guard = self.io_lock.lock().await;
        let path = self.entry_path(key);

        let mut item = match read_item(&path).await {
            Loaded::Found(item) => item,
            Loaded::Missing => {
                self.stats.record_miss();
                return None;
            }
            Loaded::Unreadable(e) => {
                tracing::warn!(key, path = %path.display(), error = %e, "failed to read cache file");
                self.stats.record_miss();
                return None;
            }
            Loaded::Corrupt(e) => {
                tracing::warn!(key, path = %path.display(), error = %e, "removing corrupt cache file");
                remove_quietly(&path).await;
                self.stats.record_miss();
                return None;
            }
        };

        if item.key != key {
            tracing::warn!(key, stored = %item.key, "cache file holds a different key");
            self.stats.record_miss();
            return None;
        }

        if item.is_expired() {
            remove_quietly(&path).await;
            self.stats.record_expired_miss();
            tracing::debug!(key, "disk cache entry expired");
            return None;
        }

        item.touch();
        match serde_json::to_vec(&item) {
            Ok(bytes) => {
                if let Err(e) = write_atomic(&path, &bytes).await {
                    tracing::warn!(key, error = %e, "failed to persist access metadata");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "failed to encode access metadata"),
        }

        self.stats.record_hit();
        Some(item)
    }

    /// Persist a fully built item, keeping its timestamps
    pub async fn insert_item(&self, item: &CacheItem) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::closed(StoreType::FileSystem));
        }

        let bytes = serde_json::to_vec(item)
            .map_err(|e| CacheError::serialization(&item.key, SerializationOp::Serialize, e))?;

        let path = self.entry_path(&item.key);
        let _guard = self.io_lock.lock().await;
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| CacheError::io(&path, "write cache file", e))
    }

    /// Paths of every entry file currently on disk
    async fn entry_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut read_dir = match fs::read_dir(&self.base_path).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(CACHE_FILE_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

async fn read_item(path: &Path) -> Loaded {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Loaded::Missing,
        Err(e) => return Loaded::Unreadable(e),
    };

    match serde_json::from_slice(&bytes) {
        Ok(item) => Loaded::Found(item),
        Err(e) => Loaded::Corrupt(e),
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove cache file");
        }
    }
}

#[async_trait]
impl CacheBackend for DiskCache {
    fn name(&self) -> &'static str {
        "disk"
    }

    async fn get(&self, key: &str) -> Option<Value> {
        self.get_item(key).await.map(|item| item.value)
    }

    async fn set_with_type(
        &self,
        key: &str,
        value: Value,
        item_type: &str,
        ttl: Duration,
    ) -> Result<()> {
        self.insert_item(&CacheItem::new(key, value, item_type, ttl))
            .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::closed(StoreType::FileSystem));
        }

        let path = self.entry_path(key);
        let _guard = self.io_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&path, "remove cache file", e)),
        }
    }

    async fn clear(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::closed(StoreType::FileSystem));
        }

        let _guard = self.io_lock.lock().await;

        match fs::remove_dir_all(&self.base_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(&self.base_path, "clear cache directory", e)),
        }

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| CacheError::io(&self.base_path, "recreate cache directory", e))?;

        self.stats.reset();
        Ok(())
    }

    async fn keys(&self) -> Vec<String> {
        if self.closed.load(Ordering::Acquire) {
            return Vec::new();
        }

        let _guard = self.io_lock.lock().await;
        let files = match self.entry_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(path = %self.base_path.display(), error = %e, "failed to list cache directory");
                return Vec::new();
            }
        };

        let now = Utc::now();
        let mut keys = Vec::with_capacity(files.len());
        for path in files {
            if let Loaded::Found(item) = read_item(&path).await {
                if !item.is_expired_at(now) {
                    keys.push(item.key);
                }
            }
        }
        keys
    }

    async fn stats(&self) -> CacheStatistics {
        let _guard = self.io_lock.lock().await;
        let mut stats = self.stats.snapshot();

        let files = match self.entry_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(path = %self.base_path.display(), error = %e, "failed to list cache directory");
                return stats;
            }
        };

        let mut total_bytes = 0u64;
        for path in &files {
            if let Ok(metadata) = fs::metadata(path).await {
                total_bytes += metadata.len();
            }
        }

        stats.total_entries = files.len() as u64;
        stats.disk_usage_mb = bytes_to_mb(total_bytes);
        stats
    }

    async fn expire_sweep(&self) -> Result<u64> {
        let _guard = self.io_lock.lock().await;
        let files = self
            .entry_files()
            .await
            .map_err(|e| CacheError::io(&self.base_path, "scan cache directory", e))?;

        let now = Utc::now();
        let mut removed = 0u64;
        for path in files {
            match read_item(&path).await {
                Loaded::Found(item) if item.is_expired_at(now) => {
                    remove_quietly(&path).await;
                    removed += 1;
                }
                Loaded::Corrupt(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "removing corrupt cache file");
                    remove_quietly(&path).await;
                }
                _ => {}
            }
        }

        self.stats.record_expired(removed);
        Ok(removed)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn file_count(dir: &Path) -> usize {
        let mut read_dir = fs::read_dir(dir).await.unwrap();
        let mut count = 0;
        while read_dir.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }

    #[test]
    fn test_entry_file_name() {
        let name = entry_file_name("k");
        assert_eq!(name.len(), 64 + ".cache".len());
        assert!(name.ends_with(".cache"));
        assert_eq!(name, entry_file_name("k"));
        assert_ne!(name, entry_file_name("k2"));
        // Keys with path separators still map to a flat file name
        assert!(!entry_file_name("../../etc/passwd").contains('/'));
    }

    #[tokio::test]
    async fn test_set_creates_one_file_and_delete_removes_it() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("antoine-cache-test");
        let cache = DiskCache::new(&base).await.unwrap();

        cache.set("k", json!("v"), Duration::from_secs(3600)).await.unwrap();
        assert_eq!(file_count(&base).await, 1);
        assert!(cache.entry_path("k").exists());

        cache.delete("k").await.unwrap();
        assert_eq!(file_count(&base).await, 0);

        // Absent keys are fine
        cache.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_round_trip_preserves_value() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        let value = json!({
            "name": "antoine",
            "tags": ["a", "b"],
            "nested": { "count": 3, "ratio": 0.5, "none": null }
        });

        cache.set("doc", value.clone(), Duration::from_secs(3600)).await.unwrap();
        assert_eq!(cache.get("doc").await, Some(value));
    }

    #[tokio::test]
    async fn test_floats_keep_their_exact_bits() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();

        for (i, float) in [1.0715660391465826e-75, 0.1 + 0.2, f64::MAX, f64::MIN_POSITIVE, -2.5e-308]
            .into_iter()
            .enumerate()
        {
            let key = format!("f{i}");
            cache.set(&key, json!(float), Duration::from_secs(60)).await.unwrap();

            let stored = cache.get(&key).await.unwrap();
            assert_eq!(stored.as_f64().map(f64::to_bits), Some(float.to_bits()));
        }
    }

    #[tokio::test]
    async fn test_hit_persists_access_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache
            .set_with_type("k", json!(1), "counter", Duration::from_secs(60))
            .await
            .unwrap();

        cache.get("k").await;
        let item = cache.get_item("k").await.unwrap();

        assert_eq!(item.access_count, 2);
        assert_eq!(item.item_type, "counter");

        let stored: CacheItem =
            serde_json::from_slice(&fs::read(cache.entry_path("k")).await.unwrap()).unwrap();
        assert_eq!(stored.access_count, 2);
        assert_eq!(stored.key, "k");
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_read() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache.set("k", json!("v"), Duration::from_millis(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.get("k").await, None);
        assert!(!cache.entry_path("k").exists());

        let stats = cache.stats().await;
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.total_misses, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache.set("k", json!("v"), Duration::from_secs(60)).await.unwrap();

        // Simulate a crash mid-write
        fs::write(cache.entry_path("k"), b"{\"key\": \"k\", \"val").await.unwrap();

        assert_eq!(cache.get("k").await, None);
        assert!(!cache.entry_path("k").exists());
        assert_eq!(cache.stats().await.total_misses, 1);
    }

    #[tokio::test]
    async fn test_keys_recovers_original_keys() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        let ttl = Duration::from_secs(60);

        cache.set("repo:antoine/cli", json!(1), ttl).await.unwrap();
        cache.set("user:42", json!(2), ttl).await.unwrap();
        cache.set("gone", json!(3), Duration::ZERO).await.unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").await.unwrap();

        let mut keys = cache.keys().await;
        keys.sort();
        assert_eq!(keys, vec!["repo:antoine/cli".to_string(), "user:42".to_string()]);
    }

    #[tokio::test]
    async fn test_stats_sum_file_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache.set("a", json!("x".repeat(2048)), Duration::from_secs(60)).await.unwrap();
        cache.set("b", json!(1), Duration::from_secs(60)).await.unwrap();

        let stats = cache.stats().await;
        let expected = fs::metadata(cache.entry_path("a")).await.unwrap().len()
            + fs::metadata(cache.entry_path("b")).await.unwrap().len();

        assert_eq!(stats.total_entries, 2);
        assert!((stats.disk_usage_mb - bytes_to_mb(expected)).abs() < 1e-12);
        assert_eq!(stats.memory_usage_mb, 0.0);
    }

    #[tokio::test]
    async fn test_expire_sweep_removes_stale_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache.set("old", json!(1), Duration::from_millis(1)).await.unwrap();
        cache.set("fresh", json!(2), Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(cache.expire_sweep().await.unwrap(), 1);
        assert!(!cache.entry_path("old").exists());
        assert!(cache.entry_path("fresh").exists());
        assert_eq!(cache.stats().await.expired_entries, 1);
    }

    #[tokio::test]
    async fn test_clear_recreates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path().join("c")).await.unwrap();
        cache.set("a", json!(1), Duration::from_secs(60)).await.unwrap();
        cache.get("a").await;

        cache.clear().await.unwrap();

        assert!(cache.base_path().is_dir());
        assert!(cache.keys().await.is_empty());
        assert_eq!(cache.get("a").await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.total_hits, 0);
        assert_eq!(stats.total_misses, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache.set("k", json!("secret"), Duration::from_secs(60)).await.unwrap();

        let mode = fs::metadata(cache.entry_path("k"))
            .await
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_unwritable_base_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "not a directory").await.unwrap();

        let result = DiskCache::new(blocker.join("cache")).await;
        assert!(matches!(result, Err(CacheError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_closed_cache_rejects_writes() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache.set("k", json!(1), Duration::from_secs(60)).await.unwrap();

        cache.close().await.unwrap();
        cache.close().await.unwrap();

        assert_eq!(cache.get("k").await, None);
        assert!(cache.set("k", json!(2), Duration::from_secs(60)).await.is_err());
        // Data stays on disk for the next process
        assert!(cache.entry_path("k").exists());
    }

    #[tokio::test]
    async fn test_write_failure_reports_entry_path() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("cache");
        let cache = DiskCache::new(&base).await.unwrap();

        // Replace the directory with a plain file so every write fails
        fs::remove_dir_all(&base).await.unwrap();
        fs::write(&base, b"not a directory").await.unwrap();

        let err = cache.set("k", json!(1), Duration::from_secs(60)).await.unwrap_err();
        match err {
            CacheError::Io { path, operation, .. } => {
                assert_eq!(path, cache.entry_path("k"));
                assert_eq!(operation, "write cache file");
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clear_after_close_keeps_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path()).await.unwrap();
        cache.set("k", json!(1), Duration::from_secs(60)).await.unwrap();
        cache.close().await.unwrap();

        let err = cache.clear().await.unwrap_err();
        assert!(matches!(err, CacheError::StoreUnavailable { .. }));
        assert!(cache.entry_path("k").exists());

        let reopened = DiskCache::new(temp_dir.path()).await.unwrap();
        assert_eq!(reopened.get("k").await, Some(json!(1)));
    }
}
