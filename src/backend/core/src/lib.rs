#![allow(clippy::result_large_err)]
//! # Grantline Core
//!
//! Authorization resolution and per-identity caching.
//!
//! ## Architecture
//!
//! - **Authz**: partitions raw grant/revoke records into global, group and
//!   user layers and resolves them into a per-category decision
//! - **Cache**: single-flight, TTL-bounded cache of per-identity snapshots
//!   driven by session and configuration lifecycle events
//! - **Config**: file and environment configuration
//! - **Telemetry**: structured logging and metrics

pub mod authz;
pub mod cache;
pub mod config;
pub mod error;
pub mod telemetry;

pub use error::{ErrorCode, ErrorDetails, ErrorSeverity, GrantlineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::authz::{
        resolve, AuthorizationDocument, AuthorizationKind, AuthorizationRecord,
        AuthorizationRequirement, AuthorizationSource, EngineAlias, GroupId, IdentityAuthorizations,
        IdentityContext, Permission, ResolvedResourceAuthorization, ResolvingFetcher,
        ResourceCategory, StaticAuthorizationSource, UserId, ALL_RESOURCES,
    };
    pub use crate::cache::{
        spawn_lifecycle_listener, AuthorizationCacheConfig, AuthorizationFetcher, CacheStats,
        CachingAuthorizationService, FetchFn, LifecycleEvent,
    };
    pub use crate::config::Config;
    pub use crate::error::{ErrorCode, ErrorDetails, ErrorSeverity, GrantlineError, Result};
}
