//! Configuration and entry types for the deduplication cache.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl DedupConfig {
    /// Sweep interval is `min(ttl/2, 60s)`, per the dedup cache's eviction policy.
    pub fn sweep_interval(&self) -> Duration {
        std::cmp::min(self.ttl / 2, Duration::from_secs(60))
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(300), capacity: 10_000 }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) inserted_at_millis: i64,
    pub(crate) delivery_id: String,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct DedupStats {
    pub size: usize,
    pub max_entries: usize,
    pub ttl_ms: i64,
}
