//! Per-identity authorization snapshot spanning every connected engine.
//!
//! An [`IdentityAuthorizations`] is what the caching service usually stores:
//! one [`ResolvedResourceAuthorization`] per engine and resource category,
//! computed in a single pass when the snapshot is loaded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::decision::ResolvedResourceAuthorization;
use super::models::{AuthorizationRecord, EngineAlias, IdentityContext, Permission, ResourceCategory, UserId};
use super::partition::PartitionedRecords;
use super::resolver::resolve_partitioned;

/// A resource category together with the permissions a check cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequirement {
    pub category: ResourceCategory,
    pub relevant_permissions: HashSet<Permission>,
}

impl AuthorizationRequirement {
    pub fn new<I, P>(category: impl Into<ResourceCategory>, relevant_permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            category: category.into(),
            relevant_permissions: relevant_permissions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolved decisions for one identity, keyed by engine then category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAuthorizations {
    pub user_id: UserId,
    pub resolved_at: DateTime<Utc>,
    engines: BTreeMap<EngineAlias, BTreeMap<ResourceCategory, ResolvedResourceAuthorization>>,
}

impl IdentityAuthorizations {
    /// An empty snapshot; every query on it answers "not authorized".
    pub fn empty(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            resolved_at: Utc::now(),
            engines: BTreeMap::new(),
        }
    }

    /// Resolve every requirement against every engine's records.
    ///
    /// Records are partitioned once per engine and reused for all
    /// requirements.
    pub fn resolve<'r, I>(
        identity: &IdentityContext,
        records_by_engine: I,
        requirements: &[AuthorizationRequirement],
    ) -> Self
    where
        I: IntoIterator<Item = (&'r EngineAlias, &'r [AuthorizationRecord])>,
    {
        let mut snapshot = Self::empty(identity.user_id.clone());

        for (engine, records) in records_by_engine {
            let partitions = PartitionedRecords::split(records, identity);
            for requirement in requirements {
                let decision = resolve_partitioned(
                    engine,
                    &partitions,
                    &requirement.relevant_permissions,
                    &requirement.category,
                );
                snapshot.insert(engine.clone(), requirement.category.clone(), decision);
            }
        }

        snapshot
    }

    /// Store a decision, replacing any previous one for the same key.
    pub fn insert(
        &mut self,
        engine: EngineAlias,
        category: ResourceCategory,
        decision: ResolvedResourceAuthorization,
    ) {
        self.engines.entry(engine).or_default().insert(category, decision);
    }

    pub fn decision(
        &self,
        engine: &EngineAlias,
        category: &ResourceCategory,
    ) -> Option<&ResolvedResourceAuthorization> {
        self.engines.get(engine).and_then(|categories| categories.get(category))
    }

    /// Unknown engines and categories are never authorized.
    pub fn is_authorized(&self, engine: &EngineAlias, category: &ResourceCategory, resource_id: &str) -> bool {
        self.decision(engine, category)
            .is_some_and(|decision| decision.is_authorized(resource_id))
    }

    pub fn is_authorized_in_any_engine(&self, category: &ResourceCategory, resource_id: &str) -> bool {
        self.engines.values().any(|categories| {
            categories
                .get(category)
                .is_some_and(|decision| decision.is_authorized(resource_id))
        })
    }

    /// Engines that authorize `resource_id`, in alias order.
    pub fn authorized_engines(&self, category: &ResourceCategory, resource_id: &str) -> Vec<&EngineAlias> {
        self.engines
            .iter()
            .filter(|(_, categories)| {
                categories
                    .get(category)
                    .is_some_and(|decision| decision.is_authorized(resource_id))
            })
            .map(|(engine, _)| engine)
            .collect()
    }

    /// Keep the authorized ids of a candidate listing for one engine.
    pub fn filter_authorized<'a, I>(
        &self,
        engine: &EngineAlias,
        category: &ResourceCategory,
        candidates: I,
    ) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self.decision(engine, category) {
            Some(decision) => decision.filter_authorized(candidates),
            None => Vec::new(),
        }
    }

    pub fn engines(&self) -> impl Iterator<Item = &EngineAlias> {
        self.engines.keys()
    }
}
