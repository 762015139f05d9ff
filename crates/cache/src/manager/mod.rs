//! The cache manager facade
//!
//! A [`CacheManager`] owns exactly one backend, chosen from configuration at
//! construction. It resolves per-key TTLs, serializes access to the backend
//! behind an async reader/writer lock, and runs the periodic expiration
//! sweep.

mod cleanup;
mod global;
mod ttl;


pub use global::{global, install_global};
pub use ttl::TtlPolicy;

use crate::backends::create_backend;
use crate::config::CacheConfig;
use crate::errors::{CacheError, Result, SerializationOp};
use crate::statistics::CacheStatistics;
use crate::traits::CacheBackend;
use cleanup::CleanupTask;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub(crate) type SharedBackend = Arc<RwLock<Box<dyn CacheBackend>>>;

/// Facade over the configured cache backend
pub struct CacheManager {
    config: CacheConfig,
    ttl_policy: TtlPolicy,
    backend: SharedBackend,
    /// Taken on close so the stop signal is sent at most once
    cleanup: parking_lot::Mutex<Option<CleanupTask>>,
}

impl CacheManager {
    /// Build a manager for `config`
    ///
    /// Fails with a configuration error when the configuration is invalid or
    /// the disk directory cannot be created. Must be called inside a tokio
    /// runtime when a cleanup interval is configured.
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let backend = create_backend(&config).await?;
        let backend_name = backend.name();
        let backend: SharedBackend = Arc::new(RwLock::new(backend));

        let cleanup = if config.enabled && !config.cleanup_interval.is_zero() {
            Some(CleanupTask::spawn(
                Arc::clone(&backend),
                config.cleanup_interval,
            ))
        } else {
            None
        };

        tracing::info!(
            backend = backend_name,
            enabled = config.enabled,
            cleanup_interval_ms = config.cleanup_interval.as_millis() as u64,
            "cache manager initialized"
        );

        Ok(Self {
            ttl_policy: TtlPolicy::new(&config.ttl, config.default_ttl),
            config,
            backend,
            cleanup: parking_lot::Mutex::new(cleanup),
        })
    }

    /// The configuration this manager was built from
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Name of the active backend
    pub async fn backend_name(&self) -> &'static str {
        self.backend.read().await.name()
    }

    /// TTL that [`set`](Self::set) would apply to `key`
    pub fn resolve_ttl(&self, key: &str) -> Duration {
        self.ttl_policy.resolve(key)
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.backend.read().await.get(key).await
    }

    /// Get a value and deserialize it as `T`
    ///
    /// A stored value of a different shape is treated as a miss.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::debug!(key, error = %e, "cached value has unexpected shape");
                None
            }
        }
    }

    /// Store `value` with the TTL configured for the key's prefix
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let ttl = self.resolve_ttl(key);
        self.set_with_type(key, value, "", ttl).await
    }

    /// Store `value` with an explicit TTL
    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        self.set_with_type(key, value, "", ttl).await
    }

    /// Store `value` with a type tag and an explicit TTL
    pub async fn set_with_type<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        item_type: &str,
        ttl: Duration,
    ) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| CacheError::serialization(key, SerializationOp::Serialize, e))?;

        self.backend
            .write()
            .await
            .set_with_type(key, value, item_type, ttl)
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.backend.write().await.delete(key).await
    }

    pub async fn clear(&self) -> Result<()> {
        let backend = self.backend.write().await;
        backend.clear().await?;
        tracing::info!(backend = backend.name(), "cache cleared");
        Ok(())
    }

    pub async fn keys(&self) -> Vec<String> {
        self.backend.read().await.keys().await
    }

    pub async fn stats(&self) -> CacheStatistics {
        self.backend.read().await.stats().await
    }

    /// Remove expired entries now instead of waiting for the next tick
    pub async fn sweep_expired(&self) -> Result<u64> {
        let backend = self.backend.write().await;
        let removed = backend.expire_sweep().await?;
        tracing::info!(backend = backend.name(), removed, "expired cache entries swept");
        Ok(removed)
    }

    /// Stop the cleanup task and close the backend
    ///
    /// Safe to call more than once.
    pub async fn close(&self) -> Result<()> {
        let task = self.cleanup.lock().take();
        if let Some(task) = task {
            task.stop().await;
            tracing::debug!("cache cleanup task stopped");
        }

        self.backend.write().await.close().await
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .field("ttl_policy", &self.ttl_policy)
            .field("cleanup_running", &self.cleanup.lock().is_some())
            .finish_non_exhaustive()
    }
}
