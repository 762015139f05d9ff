//! LFU (Least Frequently Used) eviction policy implementation

use crate::eviction::traits::EvictionPolicy;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy)]
struct Usage {
    frequency: u64,
    /// Logical clock value of the last access, breaks frequency ties
    last_tick: u64,
    cost: u64,
}

/// LFU (Least Frequently Used) eviction policy bounded by cost and count
pub struct LfuPolicy {
    usage: DashMap<String, Usage>,
    /// Total cost of resident keys
    total_cost: AtomicU64,
    clock: AtomicU64,
    max_cost: u64,
    max_entries: u64,
}

impl LfuPolicy {
    pub fn new(max_cost: u64, max_entries: u64) -> Self {
        Self {
            usage: DashMap::new(),
            total_cost: AtomicU64::new(0),
            clock: AtomicU64::new(0),
            max_cost,
            max_entries,
        }
    }

    /// Largest cost a single entry may have
    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }
}

impl EvictionPolicy for LfuPolicy {
    fn on_access(&self, key: &str) {
        let tick = self.tick();
        if let Some(mut usage) = self.usage.get_mut(key) {
            usage.frequency = usage.frequency.saturating_add(1);
            usage.last_tick = tick;
        }
    }

    fn on_insert(&self, key: &str, cost: u64) {
        let tick = self.tick();
        let previous = self.usage.insert(
            key.to_string(),
            Usage {
                frequency: 1,
                last_tick: tick,
                cost,
            },
        );
        if let Some(previous) = previous {
            self.total_cost.fetch_sub(previous.cost, Ordering::AcqRel);
        }
        self.total_cost.fetch_add(cost, Ordering::AcqRel);
    }

    fn on_remove(&self, key: &str) {
        if let Some((_, usage)) = self.usage.remove(key) {
            self.total_cost.fetch_sub(usage.cost, Ordering::AcqRel);
        }
    }

    fn has_room_for(&self, incoming: u64) -> bool {
        let cost_fits = self.memory_usage().saturating_add(incoming) <= self.max_cost;
        let count_fits = (self.tracked_keys() as u64) < self.max_entries;
        cost_fits && count_fits
    }

    fn next_eviction(&self, incoming: u64) -> Option<String> {
        if self.has_room_for(incoming) {
            return None;
        }

        // O(n) scan for the coldest key
        let mut candidate: Option<(String, u64, u64)> = None;
        for r in self.usage.iter() {
            let usage = r.value();
            let colder = match &candidate {
                Some((_, freq, tick)) => (usage.frequency, usage.last_tick) < (*freq, *tick),
                None => true,
            };
            if colder {
                candidate = Some((r.key().clone(), usage.frequency, usage.last_tick));
            }
        }

        candidate.map(|(key, _, _)| key)
    }

    fn clear(&self) {
        self.usage.clear();
        self.total_cost.store(0, Ordering::Release);
    }

    fn memory_usage(&self) -> u64 {
        self.total_cost.load(Ordering::Acquire)
    }

    fn tracked_keys(&self) -> usize {
        self.usage.len()
    }
}
