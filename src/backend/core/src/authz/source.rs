//! Upstream authorization sources and the fetch strategy that resolves them.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::models::{AuthorizationRecord, EngineAlias, GroupId, IdentityContext, UserId};
use super::snapshot::{AuthorizationRequirement, IdentityAuthorizations};
use crate::cache::AuthorizationFetcher;
use crate::error::{GrantlineError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// Source Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Where raw authorization records and group memberships come from.
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    /// Engines currently connected.
    async fn engines(&self) -> Result<Vec<EngineAlias>>;

    /// The user's identity with its current group memberships.
    async fn identity(&self, user_id: &UserId) -> Result<IdentityContext>;

    /// Raw records one engine holds for `identity`.
    async fn records(&self, engine: &EngineAlias, identity: &IdentityContext) -> Result<Vec<AuthorizationRecord>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resolving Fetcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Fetch strategy that loads records from every engine of a source and
/// resolves them into an [`IdentityAuthorizations`].
///
/// Engines are queried concurrently. The first upstream error fails the whole
/// load; no partial snapshot is ever produced.
pub struct ResolvingFetcher<S> {
    source: Arc<S>,
    requirements: Vec<AuthorizationRequirement>,
}

impl<S: AuthorizationSource> ResolvingFetcher<S> {
    pub fn new(source: Arc<S>, requirements: Vec<AuthorizationRequirement>) -> Self {
        Self { source, requirements }
    }

    pub fn requirements(&self) -> &[AuthorizationRequirement] {
        &self.requirements
    }
}

#[async_trait]
impl<S: AuthorizationSource> AuthorizationFetcher<IdentityAuthorizations> for ResolvingFetcher<S> {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn fetch(&self, user_id: &UserId) -> Result<IdentityAuthorizations> {
        let identity = self.source.identity(user_id).await?;
        let engines = self.source.engines().await?;

        let batches = try_join_all(engines.iter().map(|engine| self.source.records(engine, &identity))).await?;

        debug!(
            engines = engines.len(),
            records = batches.iter().map(Vec::len).sum::<usize>(),
            "Fetched authorization records"
        );

        Ok(IdentityAuthorizations::resolve(
            &identity,
            engines.iter().zip(batches.iter().map(Vec::as_slice)),
            &self.requirements,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Static Source
// ═══════════════════════════════════════════════════════════════════════════════

/// Serialized form of a static source: records plus group memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDocument {
    /// Engines to report even if they hold no records.
    #[serde(default)]
    pub engines: Vec<EngineAlias>,
    #[serde(default)]
    pub records: Vec<AuthorizationRecord>,
    /// Known users and the groups they belong to.
    #[serde(default)]
    pub memberships: BTreeMap<UserId, Vec<GroupId>>,
}

impl AuthorizationDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GrantlineError::from(e).with_context("path", path.display().to_string()))?;
        Self::from_json(&contents)
    }
}

/// In-memory source backed by an [`AuthorizationDocument`].
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizationSource {
    document: AuthorizationDocument,
    unavailable: BTreeSet<EngineAlias>,
}

impl StaticAuthorizationSource {
    pub fn new(document: AuthorizationDocument) -> Self {
        Self {
            document,
            unavailable: BTreeSet::new(),
        }
    }

    /// Make every query against `engine` fail as upstream-unavailable.
    pub fn with_unavailable_engine(mut self, engine: impl Into<EngineAlias>) -> Self {
        self.unavailable.insert(engine.into());
        self
    }

    pub fn document(&self) -> &AuthorizationDocument {
        &self.document
    }
}

#[async_trait]
impl AuthorizationSource for StaticAuthorizationSource {
    async fn engines(&self) -> Result<Vec<EngineAlias>> {
        let engines: BTreeSet<EngineAlias> = self
            .document
            .engines
            .iter()
            .cloned()
            .chain(self.document.records.iter().map(|r| r.engine_alias.clone()))
            .collect();
        Ok(engines.into_iter().collect())
    }

    async fn identity(&self, user_id: &UserId) -> Result<IdentityContext> {
        self.document
            .memberships
            .get(user_id)
            .map(|groups| IdentityContext::new(user_id.clone()).with_groups(groups.iter().cloned()))
            .ok_or_else(|| GrantlineError::identity_not_found(user_id.as_str()))
    }

    async fn records(&self, engine: &EngineAlias, _identity: &IdentityContext) -> Result<Vec<AuthorizationRecord>> {
        if self.unavailable.contains(engine) {
            return Err(GrantlineError::upstream_unavailable(engine.as_str(), "engine marked unavailable"));
        }

        Ok(self
            .document
            .records
            .iter()
            .filter(|record| &record.engine_alias == engine)
            .cloned()
            .collect())
    }
}
