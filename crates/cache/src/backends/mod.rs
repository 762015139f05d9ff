//! Backend strategies and the factory selecting one from configuration

mod disk;
mod hybrid;
mod memory;
mod noop;

pub use disk::{entry_file_name, DiskCache, CACHE_FILE_EXTENSION};
pub use hybrid::{HybridCache, PROMOTED_FROM};
pub use memory::MemoryCache;
pub use noop::NoOpCache;

use crate::config::{CacheConfig, CacheType};
use crate::errors::Result;
use crate::traits::CacheBackend;

/// Build the backend described by `config`
///
/// A disabled configuration always yields [`NoOpCache`]. Anything else is
/// validated first; no partially built backend is ever returned.
pub async fn create_backend(config: &CacheConfig) -> Result<Box<dyn CacheBackend>> {
    if !config.enabled {
        return Ok(Box::new(NoOpCache));
    }

    config.validate()?;

    let backend: Box<dyn CacheBackend> = match config.cache_type {
        CacheType::Memory => Box::new(MemoryCache::from_config(config)),
        CacheType::Disk => Box::new(DiskCache::new(&config.disk.path).await?),
        CacheType::Hybrid => Box::new(HybridCache::from_config(config).await?),
    };
    Ok(backend)
}
