//! Enforcement behaviour through the public enforcer API
//!
//! Role inheritance, subdomain inheritance and deny-by-default.

use proptest::prelude::*;
use rbac_authz::{
    Enforcer, MemoryTupleStore, ModelGraph, Policy, RoleAssignment, SubdomainLink, Tuple,
};
use std::sync::Arc;

async fn empty_enforcer() -> Enforcer {
    Enforcer::new(Arc::new(MemoryTupleStore::new())).await.unwrap()
}

// ============================================================================
// END-TO-END SCENARIO
// ============================================================================

#[tokio::test]
async fn test_policy_then_assignment_scenario() {
    let enforcer = empty_enforcer().await;

    enforcer.add_policy("admin", "root", "data1", "write").await.unwrap();

    let policies = enforcer.list_policies("root", "admin");
    assert_eq!(
        serde_json::to_value(&policies).unwrap(),
        serde_json::json!([
            {"domain": "root", "subject": "admin", "object": "data1", "action": "write"}
        ])
    );

    assert!(!enforcer.enforce("subjectX", "root", "data1", "write"));
    enforcer.add_role_assignment("subjectX", "admin", "root").await.unwrap();
    assert!(enforcer.enforce("subjectX", "root", "data1", "write"));

    enforcer.remove_role_assignment("subjectX", "admin", "root").await.unwrap();
    assert!(!enforcer.enforce("subjectX", "root", "data1", "write"));
}

// ============================================================================
// INHERITANCE
// ============================================================================

#[tokio::test]
async fn test_inheritance_through_assignment() {
    let enforcer = empty_enforcer().await;
    enforcer.add_role_assignment("alice", "editor", "acme").await.unwrap();
    enforcer.add_policy("editor", "acme", "doc", "edit").await.unwrap();

    assert!(enforcer.enforce("alice", "acme", "doc", "edit"));
    assert!(!enforcer.enforce("alice", "acme", "doc", "delete"));
    assert!(!enforcer.enforce("alice", "other", "doc", "edit"));
}

#[tokio::test]
async fn test_role_to_role_inheritance() {
    let enforcer = empty_enforcer().await;
    enforcer.add_role_assignment("alice", "editor", "acme").await.unwrap();
    enforcer.add_role_assignment("editor", "viewer", "acme").await.unwrap();
    enforcer.add_policy("viewer", "acme", "doc", "read").await.unwrap();

    assert!(enforcer.enforce("alice", "acme", "doc", "read"));
    assert!(enforcer.enforce("editor", "acme", "doc", "read"));
    assert_eq!(enforcer.implicit_roles("alice", "acme"), vec!["editor", "viewer"]);
}

#[tokio::test]
async fn test_subdomain_inheritance() {
    let enforcer = empty_enforcer().await;
    enforcer.add_subdomain_link("parent", "child").await.unwrap();
    enforcer.add_policy("role", "parent", "obj", "act").await.unwrap();
    enforcer.add_role_assignment("subject", "role", "parent").await.unwrap();

    assert!(enforcer.enforce("subject", "child", "obj", "act"));
    assert!(enforcer.enforce("subject", "parent", "obj", "act"));

    // grants made in the child do not flow upward
    enforcer.add_policy("role", "child", "child-only", "act").await.unwrap();
    assert!(enforcer.enforce("subject", "child", "child-only", "act"));
    assert!(!enforcer.enforce("subject", "parent", "child-only", "act"));
}

#[tokio::test]
async fn test_removing_link_revokes_inherited_access() {
    let enforcer = empty_enforcer().await;
    enforcer.add_subdomain_link("root", "team").await.unwrap();
    enforcer.add_policy("admin", "root", "data1", "read").await.unwrap();
    enforcer.add_role_assignment("bob", "admin", "root").await.unwrap();
    assert!(enforcer.enforce("bob", "team", "data1", "read"));

    enforcer.remove_subdomain_link("root", "team").await.unwrap();
    assert!(!enforcer.enforce("bob", "team", "data1", "read"));
}

#[test]
fn test_diamond_domain_hierarchy() {
    let graph = ModelGraph::from_tuples(vec![
        Tuple::from(SubdomainLink::new("top", "left")),
        Tuple::from(SubdomainLink::new("top", "right")),
        Tuple::from(SubdomainLink::new("left", "bottom")),
        Tuple::from(SubdomainLink::new("right", "bottom")),
        Tuple::from(Policy::new("ops", "top", "cluster", "restart")),
        Tuple::from(RoleAssignment::new("carol", "ops", "right")),
    ])
    .unwrap();

    assert_eq!(graph.ancestors("bottom"), vec!["bottom", "left", "right", "top"]);
    assert!(graph.enforce("carol", "bottom", "cluster", "restart"));
    assert!(!graph.enforce("carol", "left", "cluster", "restart"));
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

fn ident() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

proptest! {
    #[test]
    fn prop_empty_graph_denies_everything(
        subject in ident(),
        domain in ident(),
        object in ident(),
        action in ident(),
    ) {
        let graph = ModelGraph::new();
        prop_assert!(!graph.enforce(&subject, &domain, &object, &action));
    }

    #[test]
    fn prop_unmatched_object_denies(
        subject in ident(),
        role in ident(),
        object in ident(),
        other in ident(),
    ) {
        prop_assume!(object != other);
        prop_assume!(subject != role);

        let graph = ModelGraph::from_tuples(vec![
            Tuple::from(RoleAssignment::new(subject.clone(), role.clone(), "root")),
            Tuple::from(Policy::new(role.clone(), "root", object.clone(), "read")),
        ])
        .unwrap();

        prop_assert!(graph.enforce(&subject, "root", &object, "read"));
        prop_assert!(!graph.enforce(&subject, "root", &other, "read"));
        prop_assert!(!graph.enforce(&subject, "root", &object, "write"));
    }
}
