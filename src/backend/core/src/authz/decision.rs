//! The resolved authorization decision for one identity and resource category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which resources of one category an identity may access.
///
/// Only the resolver mutates a decision while building it; afterwards it is
/// read-only and gets replaced, never updated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResourceAuthorization {
    grant_all: bool,
    allowed: BTreeSet<String>,
    prohibited: BTreeSet<String>,
}

impl ResolvedResourceAuthorization {
    /// A decision that authorizes nothing.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// `resource_id` is authorized iff it is not prohibited and either every
    /// resource or this one is allowed.
    pub fn is_authorized(&self, resource_id: &str) -> bool {
        !self.prohibited.contains(resource_id)
            && (self.grant_all || self.allowed.contains(resource_id))
    }

    /// Keep only the authorized ids of a candidate listing, preserving order.
    pub fn filter_authorized<'a, I>(&self, candidates: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates
            .into_iter()
            .filter(|id| self.is_authorized(id))
            .collect()
    }

    pub fn grant_all(&self) -> bool {
        self.grant_all
    }

    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    pub fn prohibited(&self) -> &BTreeSet<String> {
        &self.prohibited
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutators used by the resolver
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn grant_all_resources(&mut self) {
        self.grant_all = true;
    }

    pub(crate) fn revoke_all_resources(&mut self) {
        self.grant_all = false;
    }

    /// Allow a specific resource. A later grant lifts an earlier prohibition.
    pub(crate) fn authorize(&mut self, resource_id: &str) {
        self.prohibited.remove(resource_id);
        self.allowed.insert(resource_id.to_string());
    }

    pub(crate) fn prohibit(&mut self, resource_id: &str) {
        self.prohibited.insert(resource_id.to_string());
    }
}
