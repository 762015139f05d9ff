//! Configuration loading with precedence
//!
//! Defaults, then a JSON config file, then `ANTOINE_CACHE_*` environment
//! variables. Later sources override earlier ones field by field.

use super::{parse_duration, CacheConfig, CacheType};
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use antoine_utils::XdgPaths;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "ANTOINE_CACHE_CONFIG";

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
}

/// Configuration plus the sources that contributed to it
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CacheConfig,
    pub sources: Vec<ConfigSource>,
}

/// Configuration loader that handles precedence
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Load configuration with full precedence handling
    pub fn load() -> Result<LoadedConfig> {
        let mut sources = vec![ConfigSource::Default];

        let path = Self::config_file_path();
        let mut config = if path.exists() {
            sources.push(ConfigSource::ConfigFile(path.clone()));
            Self::load_from_file(&path)?
        } else {
            CacheConfig::default()
        };

        sources.extend(Self::apply_env(&mut config)?);

        tracing::debug!(?sources, cache_type = %config.cache_type, "loaded cache configuration");
        Ok(LoadedConfig { config, sources })
    }

    /// Load configuration from a JSON file
    ///
    /// The file may hold the cache settings at the top level or nested under
    /// a `"cache"` key.
    pub fn load_from_file(path: &Path) -> Result<CacheConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            operation: "read config file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        })?;

        let mut document: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| config_syntax_error(path, e))?;

        let nested = document
            .get_mut("cache")
            .filter(|cache| cache.is_object())
            .map(serde_json::Value::take);
        let section = match nested {
            Some(cache) => cache,
            None => document,
        };

        serde_json::from_value(section).map_err(|e| config_syntax_error(path, e))
    }

    /// Override `config` from `ANTOINE_CACHE_*` variables
    ///
    /// Returns one source per variable applied.
    pub fn apply_env(config: &mut CacheConfig) -> Result<Vec<ConfigSource>> {
        let mut applied = Vec::new();

        if let Some(value) = env_var("ANTOINE_CACHE_ENABLED", &mut applied) {
            config.enabled = match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid_env("ANTOINE_CACHE_ENABLED", &value)),
            };
        }

        if let Some(value) = env_var("ANTOINE_CACHE_TYPE", &mut applied) {
            config.cache_type = value.parse::<CacheType>()?;
        }

        if let Some(value) = env_var("ANTOINE_CACHE_MAX_SIZE_MB", &mut applied) {
            config.max_size_mb = value
                .parse()
                .map_err(|_| invalid_env("ANTOINE_CACHE_MAX_SIZE_MB", &value))?;
        }

        if let Some(value) = env_var("ANTOINE_CACHE_MAX_ENTRIES", &mut applied) {
            config.max_entries = value
                .parse()
                .map_err(|_| invalid_env("ANTOINE_CACHE_MAX_ENTRIES", &value))?;
        }

        if let Some(value) = env_var("ANTOINE_CACHE_CLEANUP_INTERVAL", &mut applied) {
            config.cleanup_interval = parse_duration(&value)
                .map_err(|_| invalid_env("ANTOINE_CACHE_CLEANUP_INTERVAL", &value))?;
        }

        if let Some(value) = env_var("ANTOINE_CACHE_DISK_PATH", &mut applied) {
            config.disk.path = PathBuf::from(value);
        }

        Ok(applied)
    }

    /// Get the configuration file path
    pub fn config_file_path() -> PathBuf {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => XdgPaths::config_dir().join("cache.json"),
        }
    }
}

fn env_var(name: &str, applied: &mut Vec<ConfigSource>) -> Option<String> {
    let value = std::env::var(name).ok()?;
    applied.push(ConfigSource::EnvironmentVariable(name.to_string()));
    Some(value)
}

fn invalid_env(name: &str, value: &str) -> CacheError {
    CacheError::Configuration {
        message: format!("invalid value '{value}' for {name}"),
        recovery_hint: RecoveryHint::Manual {
            instructions: format!("Fix or unset the {name} environment variable"),
        },
    }
}

fn config_syntax_error(path: &Path, source: serde_json::Error) -> CacheError {
    CacheError::Serialization {
        key: path.display().to_string(),
        operation: SerializationOp::Deserialize,
        source,
        recovery_hint: RecoveryHint::Manual {
            instructions: "Check config file syntax".to_string(),
        },
    }
}
