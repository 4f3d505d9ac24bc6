//! `dedup` crate — TTL+LRU deduplication cache for webhook deliveries (C8).

pub mod cache;
pub mod models;

pub use cache::DedupCache;
pub use models::{DedupConfig, DedupStats};
