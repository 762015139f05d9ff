//! Error handling for the cache system
//!
//! Every error carries a [`RecoveryHint`] describing what the caller can do
//! about it. The cache itself never retries.

mod recovery;
mod types;

pub use types::*;
