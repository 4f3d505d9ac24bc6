//! TTL+LRU deduplication cache (C8).
//!
//! Keyed by `sha256(deliveryId || ":" || payload)`. Expiry is lazy (checked
//! on every probe) plus a periodic sweep the caller drives via [`DedupCache::sweep`];
//! overflow trims the oldest entries by insertion timestamp.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::models::{DedupConfig, DedupStats, Entry};

pub struct DedupCache {
    config: DedupConfig,
    entries: Mutex<HashMap<String, Entry>>,
}

impl DedupCache {
    pub fn new(config: DedupConfig) -> Self {
        Self { config, entries: Mutex::new(HashMap::new()) }
    }

    fn key(payload: &str, delivery_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(delivery_id.as_bytes());
        hasher.update(b":");
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns `true` iff a non-expired entry for this `(payload, deliveryId)`
    /// already exists; otherwise inserts a fresh entry and returns `false`.
    pub fn is_duplicate(&self, payload: &str, delivery_id: &str) -> bool {
        self.is_duplicate_at(payload, delivery_id, Utc::now())
    }

    pub(crate) fn is_duplicate_at(&self, payload: &str, delivery_id: &str, now: DateTime<Utc>) -> bool {
        let key = Self::key(payload, delivery_id);
        let ttl_ms = self.config.ttl.as_millis() as i64;
        let mut guard = self.entries.lock().expect("dedup cache mutex poisoned");

        if let Some(entry) = guard.get(&key) {
            if now.timestamp_millis() - entry.inserted_at_millis < ttl_ms {
                return true;
            }
            guard.remove(&key);
        }

        guard.insert(key, Entry { inserted_at_millis: now.timestamp_millis(), delivery_id: delivery_id.to_string() });

        if guard.len() > self.config.capacity {
            Self::trim_oldest(&mut guard, self.config.capacity);
        }

        false
    }

    fn trim_oldest(guard: &mut HashMap<String, Entry>, capacity: usize) {
        let overflow = guard.len() - capacity;
        if overflow == 0 {
            return;
        }
        let mut by_age: Vec<(String, i64)> =
            guard.iter().map(|(k, v)| (k.clone(), v.inserted_at_millis)).collect();
        by_age.sort_by_key(|(_, ts)| *ts);
        for (key, _) in by_age.into_iter().take(overflow) {
            guard.remove(&key);
        }
    }

    /// Drops expired entries. Callers should invoke this on
    /// [`DedupConfig::sweep_interval`] rather than relying solely on lazy
    /// expiry during probes.
    pub fn sweep(&self) {
        self.sweep_at(Utc::now());
    }

    pub(crate) fn sweep_at(&self, now: DateTime<Utc>) {
        let ttl_ms = self.config.ttl.as_millis() as i64;
        let mut guard = self.entries.lock().expect("dedup cache mutex poisoned");
        guard.retain(|_, entry| now.timestamp_millis() - entry.inserted_at_millis < ttl_ms);
    }

    pub fn stats(&self) -> DedupStats {
        let guard = self.entries.lock().expect("dedup cache mutex poisoned");
        DedupStats { size: guard.len(), max_entries: self.config.capacity, ttl_ms: self.config.ttl.as_millis() as i64 }
    }
}
