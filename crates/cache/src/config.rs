//! Cache configuration
//!
//! [`CacheConfig`] is the policy handed to [`crate::CacheManager`] at
//! construction. It deserializes from JSON with every field optional, so a
//! config file only needs to name what it changes.

mod duration;
mod loader;

pub use duration::parse_duration;
pub use loader::{CacheConfigLoader, ConfigSource, LoadedConfig};

use crate::errors::{CacheError, RecoveryHint, Result};
use antoine_utils::XdgPaths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// TTL applied when no configured prefix matches a key
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Backend strategy selected by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CacheType {
    Memory,
    Disk,
    Hybrid,
}

impl FromStr for CacheType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(CacheError::Configuration {
                message: format!("unsupported cache type '{other}'"),
                recovery_hint: RecoveryHint::UseDefault {
                    value: "memory".to_string(),
                },
            }),
        }
    }
}

impl TryFrom<String> for CacheType {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Disk => f.write_str("disk"),
            Self::Hybrid => f.write_str("hybrid"),
        }
    }
}

/// Settings for file-backed storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Base directory holding one file per entry
    pub path: PathBuf,
    /// Reserved; accepted and ignored
    pub compression: bool,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            path: XdgPaths::cache_dir().join("cache"),
            compression: false,
        }
    }
}

/// Cache policy consumed by the manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false the manager runs the no-op backend
    pub enabled: bool,
    /// Backend strategy
    #[serde(rename = "type")]
    pub cache_type: CacheType,
    /// Cost budget of the memory tier
    pub max_size_mb: u64,
    /// Entry budget of the memory tier
    pub max_entries: u64,
    /// Period of the background expiration sweep; zero disables it
    #[serde(with = "duration")]
    pub cleanup_interval: Duration,
    /// Key prefix to TTL; the longest matching prefix wins
    #[serde(with = "duration::map")]
    pub ttl: BTreeMap<String, Duration>,
    /// TTL for keys no prefix matches
    #[serde(with = "duration")]
    pub default_ttl: Duration,
    pub disk: DiskConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_type: CacheType::Memory,
            max_size_mb: 100,
            max_entries: 10_000,
            cleanup_interval: Duration::from_secs(5 * 60),
            ttl: BTreeMap::new(),
            default_ttl: DEFAULT_TTL,
            disk: DiskConfig::default(),
        }
    }
}

impl CacheConfig {
    /// In-memory cache with default budgets
    pub fn memory() -> Self {
        Self::default()
    }

    /// File-backed cache rooted at `path`
    pub fn disk(path: impl Into<PathBuf>) -> Self {
        Self {
            cache_type: CacheType::Disk,
            disk: DiskConfig {
                path: path.into(),
                compression: false,
            },
            ..Self::default()
        }
    }

    /// Memory tier in front of a disk tier rooted at `path`
    pub fn hybrid(path: impl Into<PathBuf>) -> Self {
        Self {
            cache_type: CacheType::Hybrid,
            ..Self::disk(path)
        }
    }

    /// Caching turned off; the manager will use the no-op backend
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, prefix: impl Into<String>, ttl: Duration) -> Self {
        self.ttl.insert(prefix.into(), ttl);
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_max_size_mb(mut self, max_size_mb: u64) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    /// Memory budget in bytes
    pub fn max_cost_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Check the configuration can back a cache
    ///
    /// A disabled configuration is always valid.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if matches!(self.cache_type, CacheType::Memory | CacheType::Hybrid) {
            if self.max_size_mb == 0 {
                return Err(CacheError::configuration(
                    "max_size_mb must be greater than zero",
                ));
            }
            if self.max_entries == 0 {
                return Err(CacheError::configuration(
                    "max_entries must be greater than zero",
                ));
            }
        }

        if matches!(self.cache_type, CacheType::Disk | CacheType::Hybrid)
            && self.disk.path.as_os_str().is_empty()
        {
            return Err(CacheError::configuration(format!(
                "{} cache requires disk.path",
                self.cache_type
            )));
        }

        Ok(())
    }
}
