//! The unit of storage shared by every backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// A cached value with its lifecycle bookkeeping
///
/// This is also the on-disk format: the disk backend stores one JSON
/// document of this shape per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheItem {
    pub key: String,
    pub value: Value,
    /// Free-form category tag
    #[serde(rename = "type", default)]
    pub item_type: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub access_count: u64,
    pub last_access: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CacheItem {
    /// Create an item expiring `ttl` from now
    ///
    /// A zero TTL yields an item that is already expired.
    pub fn new(key: impl Into<String>, value: Value, item_type: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            value,
            item_type: item_type.into(),
            created_at: now,
            expires_at: expiry_after(now, ttl),
            access_count: 0,
            last_access: now,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry, `None` once expired
    pub fn remaining_ttl(&self) -> Option<Duration> {
        (self.expires_at - Utc::now())
            .to_std()
            .ok()
            .filter(|remaining| !remaining.is_zero())
    }

    /// Record a hit
    pub fn touch(&mut self) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_access = Utc::now();
    }

    /// Serialized size in bytes, used as the admission cost in memory
    pub fn estimated_size(&self) -> u64 {
        match serde_json::to_vec(self) {
            Ok(bytes) => bytes.len() as u64,
            Err(_) => (self.key.len() + self.item_type.len()) as u64,
        }
    }
}

/// `now + ttl`, saturating at the largest representable instant
pub(crate) fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
