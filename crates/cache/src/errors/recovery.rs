//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Configuration { recovery_hint, .. }
            | Self::Io { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::StoreUnavailable { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error is transient and the caller may retry
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::Retry { .. })
    }

    /// Check if this error invalidates construction of a cache
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl RecoveryHint {
    pub(crate) fn for_io(error: &std::io::Error, path: &Path) -> Self {
        match error.kind() {
            ErrorKind::PermissionDenied => Self::CheckPermissions {
                path: path.to_path_buf(),
            },
            ErrorKind::NotFound => Self::Recreate,
            ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => Self::Retry {
                after: Duration::from_millis(100),
            },
            _ => Self::Manual {
                instructions: format!("Inspect the cache directory at {}", path.display()),
            },
        }
    }
}
