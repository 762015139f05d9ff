//! Core error types for the cache system

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Invalid configuration, fatal to manager construction
    #[error("Invalid cache configuration: {message}")]
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },

    /// I/O errors during cache operations
    #[error("I/O error during {operation} on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Serialization/deserialization errors
    #[error("Failed to {operation} cache entry '{key}': {source}")]
    Serialization {
        key: String,
        operation: SerializationOp,
        #[source]
        source: serde_json::Error,
        recovery_hint: RecoveryHint,
    },

    /// Cache store unavailable, e.g. after it was closed
    #[error("Cache store {store_type} unavailable: {reason}")]
    StoreUnavailable {
        store_type: StoreType,
        reason: String,
        recovery_hint: RecoveryHint,
    },
}

impl CacheError {
    /// Build a configuration error with the default hint
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            recovery_hint: RecoveryHint::UpdateConfiguration,
        }
    }

    /// Build an I/O error with a hint derived from the error kind
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        let path = path.into();
        let recovery_hint = RecoveryHint::for_io(&source, &path);
        Self::Io {
            path,
            operation,
            source,
            recovery_hint,
        }
    }

    /// Build a serialization error for a specific key
    pub fn serialization(
        key: impl Into<String>,
        operation: SerializationOp,
        source: serde_json::Error,
    ) -> Self {
        Self::Serialization {
            key: key.into(),
            operation,
            source,
            recovery_hint: RecoveryHint::Manual {
                instructions: "Only JSON-representable values can be cached".to_string(),
            },
        }
    }

    /// Build an error for an operation attempted on a closed store
    pub fn closed(store_type: StoreType) -> Self {
        Self::StoreUnavailable {
            store_type,
            reason: "cache has been closed".to_string(),
            recovery_hint: RecoveryHint::Recreate,
        }
    }
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// The operation may succeed if the caller retries later
    Retry { after: Duration },

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Recreate the cache file, directory or store
    Recreate,

    /// Update cache configuration
    UpdateConfiguration,

    /// Use a default value
    UseDefault { value: String },

    /// No automated recovery possible
    Manual { instructions: String },

    /// Operation can be safely ignored
    Ignore,
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Serialize,
    Deserialize,
}

impl fmt::Display for SerializationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize => f.write_str("serialize"),
            Self::Deserialize => f.write_str("deserialize"),
        }
    }
}

/// Cache store types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Memory,
    FileSystem,
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::FileSystem => f.write_str("filesystem"),
        }
    }
}
