//! Layered resolution of authorization records into a decision.
//!
//! Resolution runs a fixed sequence of passes over one accumulator. Each pass
//! may override what an earlier one decided, so the order below is part of
//! the contract:
//!
//! ```text
//! global pass          ALL → grant all, specific → allow
//! group pass   a. REVOKE ALL       → grant_all = false
//!              b. GRANT ALL        → grant_all = true
//!              c. REVOKE specific  → prohibit
//!              d. GRANT specific   → allow (lifts an earlier prohibition)
//! user pass    a..d again over the user's own records
//! ```
//!
//! Only records of the target category whose permissions intersect the
//! relevant permissions take part. Everything here is pure; resolutions for
//! different identities may run concurrently without coordination.

use metrics::counter;
use std::collections::HashSet;
use tracing::{debug, instrument};

use super::decision::ResolvedResourceAuthorization;
use super::models::{
    AuthorizationKind, AuthorizationRecord, EngineAlias, IdentityContext, Permission,
    ResourceCategory,
};
use super::partition::PartitionedRecords;
use crate::telemetry::metrics::RESOLUTIONS_TOTAL;

/// Resolve `records` for `identity` into a decision over `category`.
#[instrument(
    skip(records, relevant_permissions, identity),
    fields(engine = %engine_alias, user_id = %identity.user_id, category = %category)
)]
pub fn resolve(
    engine_alias: &EngineAlias,
    records: &[AuthorizationRecord],
    relevant_permissions: &HashSet<Permission>,
    identity: &IdentityContext,
    category: &ResourceCategory,
) -> ResolvedResourceAuthorization {
    let partitions = PartitionedRecords::split(records, identity);
    resolve_partitioned(engine_alias, &partitions, relevant_permissions, category)
}

/// Resolve already partitioned records into a decision over `category`.
pub fn resolve_partitioned(
    engine_alias: &EngineAlias,
    partitions: &PartitionedRecords<'_>,
    relevant_permissions: &HashSet<Permission>,
    category: &ResourceCategory,
) -> ResolvedResourceAuthorization {
    if relevant_permissions.is_empty() {
        debug!(engine = %engine_alias, "No relevant permissions; nothing can apply");
    }

    let mut resolution = Resolution::new(category, relevant_permissions);
    resolution.global_pass(&partitions.global);
    resolution.subject_pass(&partitions.group_relevant);
    resolution.subject_pass(&partitions.user_relevant);
    let decision = resolution.finish();

    counter!(RESOLUTIONS_TOTAL, "engine" => engine_alias.to_string()).increment(1);
    debug!(
        engine = %engine_alias,
        category = %category,
        grant_all = decision.grant_all(),
        allowed = decision.allowed().len(),
        prohibited = decision.prohibited().len(),
        "Resolved resource authorization"
    );

    decision
}

/// Applicable records of `kind` from one layer.
fn applicable<'r>(
    records: &'r [&'r AuthorizationRecord],
    kind: AuthorizationKind,
    category: &'r ResourceCategory,
    relevant_permissions: &'r HashSet<Permission>,
) -> impl Iterator<Item = &'r AuthorizationRecord> + 'r {
    records
        .iter()
        .copied()
        .filter(move |r| r.kind == Some(kind) && r.is_applicable(category, relevant_permissions))
}

/// Accumulator for one resolution call.
struct Resolution<'a> {
    category: &'a ResourceCategory,
    relevant_permissions: &'a HashSet<Permission>,
    decision: ResolvedResourceAuthorization,
}

impl<'a> Resolution<'a> {
    fn new(category: &'a ResourceCategory, relevant_permissions: &'a HashSet<Permission>) -> Self {
        Self {
            category,
            relevant_permissions,
            decision: ResolvedResourceAuthorization::default(),
        }
    }

    fn finish(self) -> ResolvedResourceAuthorization {
        self.decision
    }

    fn global_pass(&mut self, records: &[&AuthorizationRecord]) {
        let mut grant_all = false;
        let mut allowed = Vec::new();
        for record in applicable(records, AuthorizationKind::Global, self.category, self.relevant_permissions) {
            if record.targets_all_resources() {
                grant_all = true;
            } else if let Some(resource_id) = record.specific_resource() {
                allowed.push(resource_id);
            }
        }

        if grant_all {
            self.decision.grant_all_resources();
        }
        for resource_id in allowed {
            self.decision.authorize(resource_id);
        }
    }

    /// The four ordered sub-passes over one subject layer. Each sub-pass walks
    /// the whole layer before the next one starts.
    fn subject_pass(&mut self, records: &[&AuthorizationRecord]) {
        self.revoke_all_pass(records);
        self.grant_all_pass(records);
        self.revoke_specific_pass(records);
        self.grant_specific_pass(records);
    }

    fn revoke_all_pass(&mut self, records: &[&AuthorizationRecord]) {
        let revoked = applicable(records, AuthorizationKind::Revoke, self.category, self.relevant_permissions)
            .any(AuthorizationRecord::targets_all_resources);
        if revoked {
            self.decision.revoke_all_resources();
        }
    }

    fn grant_all_pass(&mut self, records: &[&AuthorizationRecord]) {
        let granted = applicable(records, AuthorizationKind::Grant, self.category, self.relevant_permissions)
            .any(AuthorizationRecord::targets_all_resources);
        if granted {
            self.decision.grant_all_resources();
        }
    }

    fn revoke_specific_pass(&mut self, records: &[&AuthorizationRecord]) {
        let prohibited: Vec<&str> =
            applicable(records, AuthorizationKind::Revoke, self.category, self.relevant_permissions)
                .filter_map(AuthorizationRecord::specific_resource)
                .collect();
        for resource_id in prohibited {
            self.decision.prohibit(resource_id);
        }
    }

    fn grant_specific_pass(&mut self, records: &[&AuthorizationRecord]) {
        let allowed: Vec<&str> =
            applicable(records, AuthorizationKind::Grant, self.category, self.relevant_permissions)
                .filter_map(AuthorizationRecord::specific_resource)
                .collect();
        for resource_id in allowed {
            self.decision.authorize(resource_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::models::ALL_RESOURCES;

    const ENGINE: &str = "camunda-bpm";
    const CATEGORY: &str = "process-definition";

    fn view() -> HashSet<Permission> {
        [Permission::new("view")].into_iter().collect()
    }

    fn category() -> ResourceCategory {
        ResourceCategory::new(CATEGORY)
    }

    fn refs(records: &[AuthorizationRecord]) -> Vec<&AuthorizationRecord> {
        records.iter().collect()
    }

    fn run<F>(start: ResolvedResourceAuthorization, records: &[AuthorizationRecord], pass: F) -> ResolvedResourceAuthorization
    where
        F: FnOnce(&mut Resolution<'_>, &[&AuthorizationRecord]),
    {
        let category = category();
        let relevant = view();
        let mut resolution = Resolution::new(&category, &relevant);
        resolution.decision = start;
        pass(&mut resolution, &refs(records));
        resolution.finish()
    }

    fn granted_all() -> ResolvedResourceAuthorization {
        let mut decision = ResolvedResourceAuthorization::default();
        decision.grant_all_resources();
        decision
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Individual passes
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_global_pass_grants_all_and_specific() {
        let records = vec![
            AuthorizationRecord::global(ENGINE, CATEGORY, ALL_RESOURCES).with_permissions(["view"]),
            AuthorizationRecord::global(ENGINE, CATEGORY, "invoice").with_permissions(["view"]),
            AuthorizationRecord::global(ENGINE, CATEGORY, "").with_permissions(["view"]),
        ];

        let decision = run(Default::default(), &records, |r, recs| r.global_pass(recs));

        assert!(decision.grant_all());
        assert_eq!(decision.allowed().len(), 1);
        assert!(decision.allowed().contains("invoice"));
    }

    #[test]
    fn test_revoke_all_pass_clears_grant_all() {
        let records = vec![AuthorizationRecord::revoke(ENGINE, CATEGORY, ALL_RESOURCES)
            .with_permissions(["view"])
            .for_group("sales")];

        let decision = run(granted_all(), &records, |r, recs| r.revoke_all_pass(recs));

        assert!(!decision.grant_all());
    }

    #[test]
    fn test_revoke_all_pass_ignores_grants_and_specific_revokes() {
        let records = vec![
            AuthorizationRecord::grant(ENGINE, CATEGORY, ALL_RESOURCES)
                .with_permissions(["view"])
                .for_group("sales"),
            AuthorizationRecord::revoke(ENGINE, CATEGORY, "invoice")
                .with_permissions(["view"])
                .for_group("sales"),
        ];

        let decision = run(granted_all(), &records, |r, recs| r.revoke_all_pass(recs));

        assert!(decision.grant_all());
        assert!(decision.prohibited().is_empty());
    }

    #[test]
    fn test_grant_all_pass_sets_grant_all() {
        let records = vec![AuthorizationRecord::grant(ENGINE, CATEGORY, ALL_RESOURCES)
            .with_permissions(["view"])
            .for_group("sales")];

        let decision = run(Default::default(), &records, |r, recs| r.grant_all_pass(recs));

        assert!(decision.grant_all());
        assert!(decision.allowed().is_empty());
    }

    #[test]
    fn test_revoke_specific_pass_prohibits() {
        let records = vec![
            AuthorizationRecord::revoke(ENGINE, CATEGORY, "invoice")
                .with_permissions(["view"])
                .for_group("sales"),
            AuthorizationRecord::revoke(ENGINE, CATEGORY, "")
                .with_permissions(["view"])
                .for_group("sales"),
        ];

        let decision = run(granted_all(), &records, |r, recs| r.revoke_specific_pass(recs));

        assert!(decision.grant_all());
        assert_eq!(decision.prohibited().len(), 1);
        assert!(!decision.is_authorized("invoice"));
        assert!(decision.is_authorized("payroll"));
    }

    #[test]
    fn test_grant_specific_pass_allows() {
        let records = vec![AuthorizationRecord::grant(ENGINE, CATEGORY, "invoice")
            .with_permissions(["view"])
            .for_user("alice")];

        let decision = run(Default::default(), &records, |r, recs| r.grant_specific_pass(recs));

        assert!(!decision.grant_all());
        assert!(decision.is_authorized("invoice"));
        assert!(!decision.is_authorized("payroll"));
    }

    #[test]
    fn test_subject_pass_runs_sub_passes_in_order() {
        // Listed grant-first; the revoke-all sub-pass still runs before grant-all.
        let records = vec![
            AuthorizationRecord::grant(ENGINE, CATEGORY, ALL_RESOURCES)
                .with_permissions(["view"])
                .for_group("a"),
            AuthorizationRecord::grant(ENGINE, CATEGORY, "invoice")
                .with_permissions(["view"])
                .for_group("a"),
            AuthorizationRecord::revoke(ENGINE, CATEGORY, ALL_RESOURCES)
                .with_permissions(["view"])
                .for_group("b"),
            AuthorizationRecord::revoke(ENGINE, CATEGORY, "invoice")
                .with_permissions(["view"])
                .for_group("b"),
        ];

        let decision = run(Default::default(), &records, |r, recs| r.subject_pass(recs));

        assert!(decision.grant_all());
        assert!(decision.is_authorized("invoice"));
        assert!(decision.prohibited().is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Full sequence
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_records_authorize_nothing() {
        let identity = IdentityContext::new("alice");
        let decision = resolve(&ENGINE.into(), &[], &view(), &identity, &category());

        assert_eq!(decision, ResolvedResourceAuthorization::deny_all());
        assert!(!decision.is_authorized("anything"));
    }

    #[test]
    fn test_empty_relevant_permissions_authorize_nothing() {
        let records = vec![AuthorizationRecord::global(ENGINE, CATEGORY, ALL_RESOURCES).with_permissions(["view"])];
        let identity = IdentityContext::new("alice");

        let decision = resolve(&ENGINE.into(), &records, &HashSet::new(), &identity, &category());

        assert!(!decision.grant_all());
    }

    #[test]
    fn test_user_revoke_overrides_group_grant_all() {
        let records = vec![
            AuthorizationRecord::grant(ENGINE, CATEGORY, ALL_RESOURCES)
                .with_permissions(["view"])
                .for_group("sales"),
            AuthorizationRecord::revoke(ENGINE, CATEGORY, ALL_RESOURCES)
                .with_permissions(["view"])
                .for_user("alice"),
        ];
        let identity = IdentityContext::new("alice").with_groups(["sales"]);

        let decision = resolve(&ENGINE.into(), &records, &view(), &identity, &category());

        assert!(!decision.grant_all());
        assert!(!decision.is_authorized("invoice"));
    }

    #[test]
    fn test_group_revoke_all_overrides_global_grant_all() {
        let records = vec![
            AuthorizationRecord::global(ENGINE, CATEGORY, ALL_RESOURCES).with_permissions(["view"]),
            AuthorizationRecord::revoke(ENGINE, CATEGORY, ALL_RESOURCES)
                .with_permissions(["view"])
                .for_group("contractors"),
        ];
        let identity = IdentityContext::new("alice").with_groups(["contractors"]);

        let decision = resolve(&ENGINE.into(), &records, &view(), &identity, &category());

        assert!(!decision.grant_all());
    }

    #[test]
    fn test_specific_global_allow_survives_group_revoke_all() {
        let records = vec![
            AuthorizationRecord::global(ENGINE, CATEGORY, "invoice").with_permissions(["view"]),
            AuthorizationRecord::revoke(ENGINE, CATEGORY, ALL_RESOURCES)
                .with_permissions(["view"])
                .for_group("contractors"),
        ];
        let identity = IdentityContext::new("alice").with_groups(["contractors"]);

        let decision = resolve(&ENGINE.into(), &records, &view(), &identity, &category());

        assert!(decision.is_authorized("invoice"));
        assert!(!decision.is_authorized("payroll"));
    }
}
