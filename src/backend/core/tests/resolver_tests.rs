//! Resolution tests across the partitioner and the resolver.
//!
//! Covers idempotence, global grant-all, permission filtering, layer
//! precedence and the specific grant/revoke tie-break.

use grantline_core::authz::{
    resolve, AuthorizationRecord, EngineAlias, IdentityContext, Permission,
    ResolvedResourceAuthorization, ResourceCategory, ALL_RESOURCES,
};
use std::collections::HashSet;

// ============================================================================
// Test Utilities
// ============================================================================

const ENGINE: &str = "camunda-bpm";
const DEFINITIONS: &str = "process-definition";

fn engine() -> EngineAlias {
    EngineAlias::new(ENGINE)
}

fn definitions() -> ResourceCategory {
    ResourceCategory::new(DEFINITIONS)
}

fn permissions(tokens: &[&str]) -> HashSet<Permission> {
    tokens.iter().map(|t| Permission::new(*t)).collect()
}

fn global(resource_id: &str) -> AuthorizationRecord {
    AuthorizationRecord::global(ENGINE, DEFINITIONS, resource_id).with_permissions(["view"])
}

fn group_grant(resource_id: &str, group: &str) -> AuthorizationRecord {
    AuthorizationRecord::grant(ENGINE, DEFINITIONS, resource_id)
        .with_permissions(["view"])
        .for_group(group)
}

fn group_revoke(resource_id: &str, group: &str) -> AuthorizationRecord {
    AuthorizationRecord::revoke(ENGINE, DEFINITIONS, resource_id)
        .with_permissions(["view"])
        .for_group(group)
}

fn user_grant(resource_id: &str, user: &str) -> AuthorizationRecord {
    AuthorizationRecord::grant(ENGINE, DEFINITIONS, resource_id)
        .with_permissions(["view"])
        .for_user(user)
}

fn user_revoke(resource_id: &str, user: &str) -> AuthorizationRecord {
    AuthorizationRecord::revoke(ENGINE, DEFINITIONS, resource_id)
        .with_permissions(["view"])
        .for_user(user)
}

fn resolve_view(records: &[AuthorizationRecord], identity: &IdentityContext) -> ResolvedResourceAuthorization {
    resolve(&engine(), records, &permissions(&["view"]), identity, &definitions())
}

// ============================================================================
// Basic Properties
// ============================================================================

#[test]
fn test_resolution_is_idempotent() {
    let records = vec![
        global(ALL_RESOURCES),
        group_revoke("payroll", "contractors"),
        user_grant("invoice", "u1"),
    ];
    let identity = IdentityContext::new("u1").with_groups(["contractors"]);

    let first = resolve_view(&records, &identity);
    let second = resolve_view(&records, &identity);

    assert_eq!(first, second);
}

#[test]
fn test_global_grant_all_authorizes_everything() {
    let records = vec![global(ALL_RESOURCES)];
    let identity = IdentityContext::new("u1");

    let decision = resolve_view(&records, &identity);

    assert!(decision.grant_all());
    for resource in ["X", "invoice", "payroll", ""] {
        assert!(decision.is_authorized(resource), "{resource}");
    }
}

#[test]
fn test_empty_records_authorize_nothing() {
    let decision = resolve_view(&[], &IdentityContext::new("u1"));

    assert!(!decision.grant_all());
    assert!(decision.allowed().is_empty());
    assert!(decision.prohibited().is_empty());
    assert!(!decision.is_authorized("X"));
}

#[test]
fn test_non_intersecting_permissions_have_no_effect() {
    let identity = IdentityContext::new("u1").with_groups(["g1"]);
    let baseline = resolve_view(&[global("invoice")], &identity);

    let noise = [
        AuthorizationRecord::global(ENGINE, DEFINITIONS, ALL_RESOURCES).with_permissions(["edit"]),
        AuthorizationRecord::revoke(ENGINE, DEFINITIONS, "invoice")
            .with_permissions(["edit"])
            .for_group("g1"),
        AuthorizationRecord::revoke(ENGINE, DEFINITIONS, ALL_RESOURCES)
            .with_permissions(["delete"])
            .for_user("u1"),
        AuthorizationRecord::grant(ENGINE, DEFINITIONS, "payroll")
            .with_permissions(["edit", "delete"])
            .for_user("u1"),
    ];

    for record in noise {
        let records = vec![global("invoice"), record];
        assert_eq!(resolve_view(&records, &identity), baseline);
    }
}

#[test]
fn test_other_category_has_no_effect() {
    let records = vec![
        AuthorizationRecord::global(ENGINE, "decision-definition", ALL_RESOURCES).with_permissions(["view"]),
    ];
    let decision = resolve_view(&records, &IdentityContext::new("u1"));

    assert!(!decision.grant_all());
}

#[test]
fn test_malformed_records_are_ignored() {
    let mut missing_kind = user_grant("invoice", "u1");
    missing_kind.kind = None;
    let mut missing_category = user_grant("payroll", "u1");
    missing_category.resource_category = None;

    let decision = resolve_view(&[missing_kind, missing_category], &IdentityContext::new("u1"));

    assert_eq!(decision, ResolvedResourceAuthorization::deny_all());
}

#[test]
fn test_records_for_other_subjects_are_ignored() {
    let records = vec![group_grant(ALL_RESOURCES, "admins"), user_grant("invoice", "u2")];
    let decision = resolve_view(&records, &IdentityContext::new("u1").with_groups(["sales"]));

    assert!(!decision.grant_all());
    assert!(!decision.is_authorized("invoice"));
}

// ============================================================================
// Layer Precedence
// ============================================================================

#[test]
fn test_group_revoke_all_then_user_grant_all() {
    let records = vec![group_revoke(ALL_RESOURCES, "g1"), user_grant(ALL_RESOURCES, "u1")];
    let identity = IdentityContext::new("u1").with_groups(["g1"]);

    let decision = resolve_view(&records, &identity);

    assert!(decision.grant_all());
}

#[test]
fn test_group_grant_all_then_user_revoke_all() {
    let records = vec![group_grant(ALL_RESOURCES, "g1"), user_revoke(ALL_RESOURCES, "u1")];
    let identity = IdentityContext::new("u1").with_groups(["g1"]);

    let decision = resolve_view(&records, &identity);

    assert!(!decision.grant_all());
}

#[test]
fn test_group_revoke_all_overrides_global_grant_all() {
    let records = vec![global(ALL_RESOURCES), group_revoke(ALL_RESOURCES, "g1")];
    let identity = IdentityContext::new("u1").with_groups(["g1"]);

    assert!(!resolve_view(&records, &identity).grant_all());
}

#[test]
fn test_specific_revoke_survives_grant_all() {
    let records = vec![global(ALL_RESOURCES), group_revoke("payroll", "g1")];
    let identity = IdentityContext::new("u1").with_groups(["g1"]);

    let decision = resolve_view(&records, &identity);

    assert!(decision.grant_all());
    assert!(decision.is_authorized("invoice"));
    assert!(!decision.is_authorized("payroll"));
}

#[test]
fn test_revoke_all_keeps_specific_allows() {
    let records = vec![group_grant("invoice", "g1"), user_revoke(ALL_RESOURCES, "u1")];
    let identity = IdentityContext::new("u1").with_groups(["g1"]);

    let decision = resolve_view(&records, &identity);

    assert!(!decision.grant_all());
    assert!(decision.is_authorized("invoice"));
    assert!(!decision.is_authorized("payroll"));
}

// ============================================================================
// Specific Grant/Revoke Tie-Break
// ============================================================================

#[test]
fn test_group_revoke_then_user_grant_authorizes() {
    let records = vec![group_revoke("X", "G1"), user_grant("X", "u1")];
    let identity = IdentityContext::new("u1").with_groups(["G1"]);

    let decision = resolve_view(&records, &identity);

    assert!(decision.is_authorized("X"));
    assert!(decision.prohibited().is_empty());
}

#[test]
fn test_group_grant_then_user_revoke_prohibits() {
    let records = vec![group_grant("X", "G1"), user_revoke("X", "u1")];
    let identity = IdentityContext::new("u1").with_groups(["G1"]);

    let decision = resolve_view(&records, &identity);

    assert!(!decision.is_authorized("X"));
    assert!(decision.prohibited().contains("X"));
}

#[test]
fn test_conflicting_groups_grant_wins() {
    let records = vec![group_revoke("X", "G1"), group_grant("X", "G2")];
    let identity = IdentityContext::new("u1").with_groups(["G1", "G2"]);

    assert!(resolve_view(&records, &identity).is_authorized("X"));
}

#[test]
fn test_user_revoke_beats_global_allow() {
    let records = vec![global("X"), user_revoke("X", "u1")];
    let identity = IdentityContext::new("u1");

    assert!(!resolve_view(&records, &identity).is_authorized("X"));
}

// ============================================================================
// Listing Filter
// ============================================================================

#[test]
fn test_filter_listing() {
    let records = vec![
        global(ALL_RESOURCES),
        group_revoke("payroll", "contractors"),
        user_revoke("hr-review", "u1"),
    ];
    let identity = IdentityContext::new("u1").with_groups(["contractors"]);

    let decision = resolve_view(&records, &identity);
    let visible = decision.filter_authorized(["invoice", "payroll", "hr-review", "shipping"]);

    assert_eq!(visible, vec!["invoice", "shipping"]);
}
