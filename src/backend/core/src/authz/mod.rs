//! Authorization resolution.
//!
//! This module provides:
//! - **Models**: authorization records, identifiers and the identity context
//! - **Partitioner**: splits raw records into global, group and user layers
//! - **Resolver**: merges the layers into a [`ResolvedResourceAuthorization`]
//! - **Snapshot**: per-identity decisions across engines and categories
//! - **Sources**: upstream record sources and the resolving fetch strategy
//!
//! # Usage
//!
//! ```rust,ignore
//! use grantline_core::authz::{resolve, AuthorizationRecord, IdentityContext, ALL_RESOURCES};
//!
//! let records = vec![
//!     AuthorizationRecord::global("camunda-bpm", "process-definition", ALL_RESOURCES)
//!         .with_permissions(["READ"]),
//!     AuthorizationRecord::revoke("camunda-bpm", "process-definition", "payroll")
//!         .with_permissions(["READ"])
//!         .for_group("contractors"),
//! ];
//! let identity = IdentityContext::new("alice").with_groups(["contractors"]);
//!
//! let decision = resolve(
//!     &"camunda-bpm".into(),
//!     &records,
//!     &["READ".into()].into_iter().collect(),
//!     &identity,
//!     &"process-definition".into(),
//! );
//! assert!(decision.is_authorized("invoice"));
//! assert!(!decision.is_authorized("payroll"));
//! ```

pub mod models;
pub mod partition;
pub mod decision;
pub mod resolver;
pub mod snapshot;
pub mod source;

pub use models::{
    AuthorizationKind, AuthorizationRecord, EngineAlias, GroupId, IdentityContext,
    Permission, ResourceCategory, UserId, ALL_RESOURCES,
};
pub use partition::{partition, PartitionedRecords};
pub use decision::ResolvedResourceAuthorization;
pub use resolver::{resolve, resolve_partitioned};
pub use snapshot::{AuthorizationRequirement, IdentityAuthorizations};
pub use source::{
    AuthorizationDocument, AuthorizationSource, ResolvingFetcher, StaticAuthorizationSource,
};
