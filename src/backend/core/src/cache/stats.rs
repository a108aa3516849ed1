//! Counters behind [`CachingAuthorizationService::stats`](super::CachingAuthorizationService::stats).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::telemetry::CacheMetrics;

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that had to wait for a load
    pub misses: u64,

    /// Successful fetch executions
    pub loads: u64,

    /// Failed fetch executions
    pub load_failures: u64,

    /// Entries removed by invalidation
    pub invalidations: u64,

    /// Entries currently held
    pub entries: u64,

    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

impl CacheStats {
    /// Calculate the hit rate.
    pub fn calculate_hit_rate(&mut self) {
        let total = self.hits + self.misses;
        self.hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
    }
}

/// Live counters; every update is mirrored to the metrics facade.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    invalidations: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        CacheMetrics::hit();
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        CacheMetrics::miss();
    }

    pub(crate) fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        CacheMetrics::load();
    }

    pub(crate) fn record_load_failure(&self, code: &str) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
        CacheMetrics::load_failure(code);
    }

    pub(crate) fn record_invalidations(&self, reason: &'static str, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
        CacheMetrics::invalidations(reason, count);
    }

    pub(crate) fn snapshot(&self, entries: u64) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entries,
            hit_rate: 0.0,
        };
        stats.calculate_hit_rate();
        CacheMetrics::entries(entries);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let counters = StatsCounters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();

        let stats = counters.snapshot(1);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_hit_rate_is_zero() {
        let stats = StatsCounters::default().snapshot(0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_invalidations_accumulate() {
        let counters = StatsCounters::default();
        counters.record_invalidations("session_end", 1);
        counters.record_invalidations("invalidate_all", 4);
        assert_eq!(counters.snapshot(0).invalidations, 5);
    }
}
