//! Core eviction policy trait definition

/// Eviction policy trait
pub trait EvictionPolicy: Send + Sync {
    /// Record access to a key
    fn on_access(&self, key: &str);

    /// Record insertion of a key with its admission cost
    fn on_insert(&self, key: &str, cost: u64);

    /// Record removal of a key
    fn on_remove(&self, key: &str);

    /// Whether a newcomer costing `incoming` fits without evicting
    fn has_room_for(&self, incoming: u64) -> bool;

    /// Get next key to evict to make room for `incoming`
    ///
    /// Returns `None` when no eviction is needed or nothing is left to evict.
    fn next_eviction(&self, incoming: u64) -> Option<String>;

    /// Clear all tracking data
    fn clear(&self);

    /// Total cost of resident keys
    fn memory_usage(&self) -> u64;

    /// Number of resident keys
    fn tracked_keys(&self) -> usize;
}
