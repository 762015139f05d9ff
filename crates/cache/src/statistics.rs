//! Cache statistics tracking and reporting

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Point-in-time statistics of a backend
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_entries: u64,
    pub memory_usage_mb: f64,
    pub disk_usage_mb: f64,
    pub hit_ratio: f64,
    pub miss_ratio: f64,
    pub total_hits: u64,
    pub total_misses: u64,
    pub expired_entries: u64,
    pub evicted_entries: u64,
}

impl CacheStatistics {
    /// Recompute both ratios from the raw hit and miss counts
    ///
    /// Ratios sum to one when any lookup happened, otherwise both are zero.
    pub fn recompute_ratios(&mut self) {
        let total = self.total_hits + self.total_misses;
        if total == 0 {
            self.hit_ratio = 0.0;
            self.miss_ratio = 0.0;
        } else {
            self.hit_ratio = self.total_hits as f64 / total as f64;
            self.miss_ratio = 1.0 - self.hit_ratio;
        }
    }

    /// Combine two tiers by summing raw counts, then deriving ratios
    pub fn combine(&self, other: &CacheStatistics) -> CacheStatistics {
        let mut combined = CacheStatistics {
            total_entries: self.total_entries + other.total_entries,
            memory_usage_mb: self.memory_usage_mb + other.memory_usage_mb,
            disk_usage_mb: self.disk_usage_mb + other.disk_usage_mb,
            total_hits: self.total_hits + other.total_hits,
            total_misses: self.total_misses + other.total_misses,
            expired_entries: self.expired_entries + other.expired_entries,
            evicted_entries: self.evicted_entries + other.evicted_entries,
            ..Default::default()
        };
        combined.recompute_ratios();
        combined
    }

    /// Total number of lookups
    pub fn total_lookups(&self) -> u64 {
        self.total_hits + self.total_misses
    }
}

pub(crate) fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Lock-free counters owned by each backend
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    evicted: AtomicU64,
}

impl StatsCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// An expired entry was found on read: counts as a miss too
    pub fn record_expired_miss(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self, count: u64) {
        self.expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_evicted(&self, count: u64) {
        self.evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.expired.store(0, Ordering::Relaxed);
        self.evicted.store(0, Ordering::Relaxed);
    }

    /// Snapshot of the counters; entry and usage fields are left for the
    /// backend to fill in
    pub fn snapshot(&self) -> CacheStatistics {
        let mut stats = CacheStatistics {
            total_hits: self.hits.load(Ordering::Relaxed),
            total_misses: self.misses.load(Ordering::Relaxed),
            expired_entries: self.expired.load(Ordering::Relaxed),
            evicted_entries: self.evicted.load(Ordering::Relaxed),
            ..Default::default()
        };
        stats.recompute_ratios();
        stats
    }
}
