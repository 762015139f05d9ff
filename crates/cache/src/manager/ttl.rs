//! Per-key TTL resolution from configured prefixes

use std::collections::BTreeMap;
use std::time::Duration;

/// Maps keys to TTLs by longest matching prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Sorted longest prefix first
    rules: Vec<(String, Duration)>,
    default_ttl: Duration,
}

impl TtlPolicy {
    pub fn new(prefixes: &BTreeMap<String, Duration>, default_ttl: Duration) -> Self {
        let mut rules: Vec<(String, Duration)> = prefixes
            .iter()
            .map(|(prefix, ttl)| (prefix.clone(), *ttl))
            .collect();
        rules.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { rules, default_ttl }
    }

    /// TTL for `key`: the longest configured prefix it starts with, else the
    /// default
    pub fn resolve(&self, key: &str) -> Duration {
        self.rules
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix.as_str()))
            .map(|(_, ttl)| *ttl)
            .unwrap_or(self.default_ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
