//! Metric names and recorders for resolution and the authorization cache.
//!
//! Metrics go through the `metrics` facade. No exporter is installed here;
//! the host process installs whichever recorder it uses.

use metrics::{counter, describe_counter, describe_gauge, gauge};

pub const RESOLUTIONS_TOTAL: &str = "grantline_resolutions_total";
pub const CACHE_HITS_TOTAL: &str = "grantline_authorization_cache_hits_total";
pub const CACHE_MISSES_TOTAL: &str = "grantline_authorization_cache_misses_total";
pub const CACHE_LOADS_TOTAL: &str = "grantline_authorization_cache_loads_total";
pub const CACHE_LOAD_FAILURES_TOTAL: &str = "grantline_authorization_cache_load_failures_total";
pub const CACHE_INVALIDATIONS_TOTAL: &str = "grantline_authorization_cache_invalidations_total";
pub const CACHE_ENTRIES: &str = "grantline_authorization_cache_entries";
pub const ERRORS_TOTAL: &str = "grantline_errors_total";

/// Register descriptions for every metric this crate emits.
pub fn describe_metrics() {
    describe_counter!(RESOLUTIONS_TOTAL, "Total number of resource authorization resolutions");

    describe_counter!(CACHE_HITS_TOTAL, "Authorization cache lookups served from the cache");
    describe_counter!(CACHE_MISSES_TOTAL, "Authorization cache lookups that required a load");
    describe_counter!(CACHE_LOADS_TOTAL, "Fetch strategy executions that completed successfully");
    describe_counter!(CACHE_LOAD_FAILURES_TOTAL, "Fetch strategy executions that failed");
    describe_counter!(CACHE_INVALIDATIONS_TOTAL, "Authorization cache invalidations by reason");
    describe_gauge!(CACHE_ENTRIES, "Entries currently held by the authorization cache");

    describe_counter!(ERRORS_TOTAL, "Total number of errors by code, category and severity");
}

/// Recorders for the authorization cache.
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn hit() {
        counter!(CACHE_HITS_TOTAL).increment(1);
    }

    pub fn miss() {
        counter!(CACHE_MISSES_TOTAL).increment(1);
    }

    pub fn load() {
        counter!(CACHE_LOADS_TOTAL).increment(1);
    }

    pub fn load_failure(code: &str) {
        counter!(CACHE_LOAD_FAILURES_TOTAL, "code" => code.to_string()).increment(1);
    }

    pub fn invalidations(reason: &'static str, count: u64) {
        counter!(CACHE_INVALIDATIONS_TOTAL, "reason" => reason).increment(count);
    }

    pub fn entries(count: u64) {
        gauge!(CACHE_ENTRIES).set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_without_exporter_are_noops() {
        describe_metrics();
        CacheMetrics::hit();
        CacheMetrics::miss();
        CacheMetrics::load();
        CacheMetrics::load_failure("UPSTREAM_UNAVAILABLE");
        CacheMetrics::invalidations("session_end", 1);
        CacheMetrics::entries(3);
    }

    #[test]
    fn test_metric_names_share_prefix() {
        for name in [
            RESOLUTIONS_TOTAL,
            CACHE_HITS_TOTAL,
            CACHE_MISSES_TOTAL,
            CACHE_LOADS_TOTAL,
            CACHE_LOAD_FAILURES_TOTAL,
            CACHE_INVALIDATIONS_TOTAL,
            CACHE_ENTRIES,
            ERRORS_TOTAL,
        ] {
            assert!(name.starts_with("grantline_"), "{name}");
        }
    }
}
