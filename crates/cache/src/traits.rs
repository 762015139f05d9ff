//! The contract every cache backend implements

use crate::errors::Result;
use crate::statistics::CacheStatistics;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Polymorphic cache backend
///
/// Reads never fail: an absent, expired, unreadable or corrupt entry is a
/// miss. Mutations report I/O and serialization failures with context.
/// Implementations guard their own state, so a backend is safe to use
/// without the manager in front of it.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Look up a live value, recording the hit or miss
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` expiring `ttl` from now with an empty type tag
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.set_with_type(key, value, "", ttl).await
    }

    /// Store `value` with a type tag, expiring `ttl` from now
    ///
    /// A zero TTL is accepted; the entry is stored but never returned.
    async fn set_with_type(
        &self,
        key: &str,
        value: Value,
        item_type: &str,
        ttl: Duration,
    ) -> Result<()>;

    /// Remove `key`; absence is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every entry and reset the statistics counters
    async fn clear(&self) -> Result<()>;

    /// Live keys, best effort
    async fn keys(&self) -> Vec<String>;

    /// Snapshot of the backend statistics
    async fn stats(&self) -> CacheStatistics;

    /// Remove every expired entry, returning how many were removed
    async fn expire_sweep(&self) -> Result<u64>;

    /// Release resources; calling it again is a no-op
    async fn close(&self) -> Result<()>;
}
