//! Sentinel backend used when caching is disabled

use crate::errors::Result;
use crate::statistics::CacheStatistics;
use crate::traits::CacheBackend;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Backend that stores nothing
///
/// Lets callers use the same code path whether or not caching is enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpCache;

#[async_trait]
impl CacheBackend for NoOpCache {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn set_with_type(
        &self,
        _key: &str,
        _value: Value,
        _item_type: &str,
        _ttl: Duration,
    ) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    async fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    async fn stats(&self) -> CacheStatistics {
        CacheStatistics::default()
    }

    async fn expire_sweep(&self) -> Result<u64> {
        Ok(0)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
