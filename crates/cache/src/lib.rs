//! Multi-tier cache for antoine
//!
//! A [`CacheManager`] fronts one of several interchangeable backends:
//! - [`MemoryCache`](backends::MemoryCache): bounded, LFU-evicting, in-process
//! - [`DiskCache`](backends::DiskCache): one JSON file per key
//! - [`HybridCache`](backends::HybridCache): memory first, disk behind it
//! - [`NoOpCache`](backends::NoOpCache): used when caching is disabled
//!
//! ```no_run
//! use antoine_cache::{CacheConfigLoader, CacheManager};
//!
//! # async fn run() -> antoine_cache::Result<()> {
//! let loaded = CacheConfigLoader::load()?;
//! let cache = CacheManager::new(loaded.config).await?;
//!
//! cache.set("repo:antoine", &serde_json::json!({ "stars": 7 })).await?;
//! let hit = cache.get("repo:antoine").await;
//! # let _ = hit;
//! cache.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod errors;
pub mod eviction;
pub mod item;
pub mod manager;
pub mod statistics;
pub mod traits;

pub use config::{CacheConfig, CacheConfigLoader, CacheType, ConfigSource, DiskConfig, LoadedConfig};
pub use errors::{CacheError, RecoveryHint, Result};
pub use item::CacheItem;
pub use manager::{global, install_global, CacheManager, TtlPolicy};
pub use statistics::CacheStatistics;
pub use traits::CacheBackend;
