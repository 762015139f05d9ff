//! Optional process-wide accessor
//!
//! The manager is meant to be built once at startup and passed to whatever
//! needs it. For call sites where threading it through is impractical, an
//! explicitly constructed manager can be installed here once.

use super::CacheManager;
use crate::errors::{CacheError, RecoveryHint, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

static GLOBAL: OnceCell<Arc<CacheManager>> = OnceCell::new();

/// Install `manager` as the process-wide instance
///
/// Fails if one is already installed; the installed instance never changes.
pub fn install_global(manager: Arc<CacheManager>) -> Result<()> {
    GLOBAL.set(manager).map_err(|_| CacheError::Configuration {
        message: "a global cache manager is already installed".to_string(),
        recovery_hint: RecoveryHint::Ignore,
    })
}

/// The installed process-wide manager, if any
pub fn global() -> Option<Arc<CacheManager>> {
    GLOBAL.get().cloned()
}
