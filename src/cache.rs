//! The bounded, thread-safe result cache (Section 4.6), keyed by
//! `sha256(bytes)`. Grounded on the teacher's `ParsedSchemaCache`
//! (`moka`-backed, concurrent-safe), generalized from caching compiled
//! schema pointers to caching whole [`ValidationReport`] values and switched
//! from `moka::future` to `moka::sync` since the runner is plain OS threads,
//! not an async executor.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::logger::Logger;
use crate::model::ValidationReport;

/// A cached report plus the approximate byte size it was inserted with.
#[derive(Debug, Clone)]
struct CacheEntry {
    report: ValidationReport,
    approx_bytes: u64,
}

/// `sha256(bytes)` rendered as lowercase hex, the cache key and the report's
/// `file_hash`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Bounded by both entry count and approximate total bytes (Section 4.6).
/// `moka` only weighs along a single dimension, so entries are weighed by
/// `max(approx_bytes, max_bytes / max_entries)`: a floor that makes many
/// tiny entries exhaust the byte budget at roughly `max_entries` entries,
/// while a few large entries are still bounded by `max_bytes` directly.
pub struct ResultCache {
    cache: moka::sync::Cache<String, CacheEntry>,
    max_bytes: u64,
}

impl ResultCache {
    pub fn new(max_entries: u64, max_bytes: u64, ttl: Duration) -> Self {
        let min_weight_per_entry = (max_bytes / max_entries.max(1)).max(1);
        let cache = moka::sync::Cache::builder()
            .max_capacity(max_bytes.max(1))
            .time_to_live(ttl)
            .weigher(move |_key: &String, entry: &CacheEntry| {
                entry.approx_bytes.max(min_weight_per_entry).min(u32::MAX as u64) as u32
            })
            .build();
        Self { cache, max_bytes }
    }

    /// Returns a clone of the cached report for `key`, or `None` on a miss
    /// or expiry. The caller may mutate the returned value freely.
    pub fn get(&self, key: &str) -> Option<ValidationReport> {
        self.cache.get(key).map(|entry| entry.report)
    }

    /// Inserts `report` under `key` with the given approximate byte size.
    /// Never fails outright: a report too large to ever fit under
    /// `max_bytes` is logged as a warning and skipped, matching "cache
    /// errors surface as warnings only, never failures".
    pub fn set(&self, key: String, report: ValidationReport, approx_bytes: u64, logger: &dyn Logger) {
        if approx_bytes > self.max_bytes {
            logger.warn(
                "result cache entry too large to store",
                vec![
                    ("key", key),
                    ("approx_bytes", approx_bytes.to_string()),
                    ("max_bytes", self.max_bytes.to_string()),
                ],
            );
            return;
        }
        self.cache.insert(key, CacheEntry { report, approx_bytes });
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn weighted_size(&self) -> u64 {
        self.cache.weighted_size()
    }
}
