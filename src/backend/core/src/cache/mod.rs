//! Per-identity authorization cache.
//!
//! This module provides:
//!
//! - **Caching Service**: bounded, TTL-limited store of one snapshot per user
//!   with single-flight loading
//! - **Fetch Strategies**: the injected [`AuthorizationFetcher`] that builds a
//!   snapshot on a miss
//! - **Lifecycle Events**: session and configuration signals, delivered
//!   directly or over a broadcast channel
//! - **Statistics**: hit/miss/load/invalidation counters
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                 CachingAuthorizationService<T>                    │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  get(user) ──► moka::future::Cache ──miss──► AuthorizationFetcher │
//! │                       ▲       (single flight per user)            │
//! │                       │                                           │
//! │  session start/refresh: invalidate + reload                       │
//! │  session end:           invalidate                                │
//! │  configuration reload:  rebuild store, drop every entry           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use grantline_core::cache::{AuthorizationCacheConfig, CachingAuthorizationService};
//!
//! let service = CachingAuthorizationService::new(fetcher, AuthorizationCacheConfig::default())?;
//!
//! service.on_identity_session_start(&user_id).await?;
//! let snapshot = service.get(&user_id).await?;
//! ```

pub mod fetcher;
pub mod lifecycle;
pub mod service;
pub mod stats;

pub use fetcher::{AuthorizationFetcher, FetchFn};
pub use lifecycle::{spawn_lifecycle_listener, LifecycleEvent};
pub use service::CachingAuthorizationService;
pub use stats::CacheStats;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{GrantlineError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// Cache Configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// Longest time-to-live the underlying store accepts (1000 years).
pub const MAX_TTL: Duration = Duration::from_secs(1000 * 365 * 24 * 3600);

/// Bounds of the authorization cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCacheConfig {
    /// Maximum number of cached identities
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,

    /// Time-to-live of a cached snapshot, e.g. `"5m"`
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for AuthorizationCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl: default_ttl(),
        }
    }
}

impl AuthorizationCacheConfig {
    /// Create a new cache configuration builder.
    pub fn builder() -> AuthorizationCacheConfigBuilder {
        AuthorizationCacheConfigBuilder::default()
    }

    /// Bounds as supplied by a configuration source counting TTL in minutes.
    pub fn from_minutes(max_entries: u64, ttl_minutes: u64) -> Self {
        Self {
            max_entries,
            ttl: Duration::from_secs(ttl_minutes.saturating_mul(60)),
        }
    }

    /// Reject zero capacity, zero TTL, or a TTL above [`MAX_TTL`].
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(GrantlineError::invalid_configuration(
                "max_entries",
                "Authorization cache capacity must be positive",
            ));
        }
        if self.ttl.is_zero() {
            return Err(GrantlineError::invalid_configuration(
                "ttl",
                "Authorization cache time-to-live must be positive",
            ));
        }
        if self.ttl > MAX_TTL {
            return Err(GrantlineError::invalid_configuration(
                "ttl",
                format!("Authorization cache time-to-live must not exceed {}s", MAX_TTL.as_secs()),
            ));
        }
        Ok(())
    }
}

/// Builder for the cache configuration.
#[derive(Debug, Default)]
pub struct AuthorizationCacheConfigBuilder {
    config: AuthorizationCacheConfig,
}

impl AuthorizationCacheConfigBuilder {
    pub fn max_entries(mut self, max_entries: u64) -> Self {
        self.config.max_entries = max_entries;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    pub fn ttl_minutes(mut self, minutes: u64) -> Self {
        self.config.ttl = Duration::from_secs(minutes.saturating_mul(60));
        self
    }

    pub fn build(self) -> AuthorizationCacheConfig {
        self.config
    }
}

fn default_max_entries() -> u64 {
    1000
}

fn default_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_defaults() {
        let config = AuthorizationCacheConfig::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_minutes() {
        let config = AuthorizationCacheConfig::from_minutes(50, 2);
        assert_eq!(config.max_entries, 50);
        assert_eq!(config.ttl, Duration::from_secs(120));
        assert_eq!(config, AuthorizationCacheConfig::builder().max_entries(50).ttl_minutes(2).build());
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let zero_capacity = AuthorizationCacheConfig::from_minutes(0, 5).validate().unwrap_err();
        assert_eq!(zero_capacity.code(), ErrorCode::InvalidConfiguration);

        let zero_ttl = AuthorizationCacheConfig::builder().ttl(Duration::ZERO).build();
        assert_eq!(zero_ttl.validate().unwrap_err().code(), ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_validate_rejects_ttl_beyond_store_limit() {
        let at_limit = AuthorizationCacheConfig::builder().ttl(MAX_TTL).build();
        assert!(at_limit.validate().is_ok());

        let beyond = AuthorizationCacheConfig::from_minutes(10, 600_000_000);
        assert_eq!(beyond.validate().unwrap_err().code(), ErrorCode::InvalidConfiguration);

        let saturated = AuthorizationCacheConfig::from_minutes(10, u64::MAX);
        assert_eq!(saturated.validate().unwrap_err().code(), ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_humantime_ttl() {
        let config: AuthorizationCacheConfig =
            serde_json::from_str(r#"{ "max_entries": 20, "ttl": "90s" }"#).unwrap();
        assert_eq!(config.max_entries, 20);
        assert_eq!(config.ttl, Duration::from_secs(90));

        let defaulted: AuthorizationCacheConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, AuthorizationCacheConfig::default());
    }
}
