//! Role inheritance resolution and the allow/deny decision
//!
//! A request `(subject, domain, object, action)` is allowed iff some policy
//! `(r, d, object, action)` exists with `d` in the domain chain (the domain
//! plus every ancestor) and `r` either the subject itself or a role the
//! subject reaches through assignments held anywhere in that chain.

use super::ModelGraph;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

impl ModelGraph {
    /// Decide whether `subject` may perform `action` on `object` in `domain`.
    ///
    /// Total over its inputs: unknown domains or subjects deny.
    pub fn enforce(&self, subject: &str, domain: &str, object: &str, action: &str) -> bool {
        let domains = self.ancestors(domain);
        let roles = self.reachable_roles(subject, &domains);

        let allowed = std::iter::once(subject)
            .chain(roles.iter().map(String::as_str))
            .any(|grantee| {
                domains
                    .iter()
                    .any(|d| self.has_policy(grantee, d, object, action))
            });

        debug!(
            subject,
            domain,
            object,
            action,
            allowed,
            domain_chain = domains.len(),
            roles = roles.len(),
            "enforce"
        );
        allowed
    }

    /// Every role `subject` holds in `domain`, directly or transitively,
    /// including roles granted in ancestor domains
    pub fn implicit_roles(&self, subject: &str, domain: &str) -> Vec<String> {
        let domains = self.ancestors(domain);
        self.reachable_roles(subject, &domains)
    }

    /// Breadth-first walk over assignments, visiting each (domain, name)
    /// pair once so cyclic assignment data still terminates
    fn reachable_roles(&self, subject: &str, domains: &[String]) -> Vec<String> {
        let mut visited: HashSet<(&str, &str)> = HashSet::new();
        let mut found: HashSet<&str> = HashSet::new();
        let mut roles = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([subject]);

        while let Some(current) = queue.pop_front() {
            for domain in domains {
                if !visited.insert((domain.as_str(), current)) {
                    continue;
                }
                for role in self.direct_roles(domain, current) {
                    if role != subject && found.insert(role.as_str()) {
                        roles.push(role.clone());
                        queue.push_back(role.as_str());
                    }
                }
            }
        }
        roles
    }
}

#[cfg(test)]
mod tests {
    use crate::model::ModelGraph;
    use crate::types::{Policy, RoleAssignment, SubdomainLink};

    fn graph() -> ModelGraph {
        let mut graph = ModelGraph::new();
        graph.add_policy(Policy::new("admin", "root", "data1", "write")).unwrap();
        graph.add_policy(Policy::new("viewer", "root", "data1", "read")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("admin", "viewer", "root")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("alice", "admin", "root")).unwrap();
        graph
    }

    #[test]
    fn test_direct_role_grants_access() {
        let graph = graph();
        assert!(graph.enforce("alice", "root", "data1", "write"));
    }

    #[test]
    fn test_role_hierarchy_is_transitive() {
        let graph = graph();
        assert!(graph.enforce("alice", "root", "data1", "read"));
        assert_eq!(graph.implicit_roles("alice", "root"), vec!["admin", "viewer"]);
    }

    #[test]
    fn test_literal_subject_policy() {
        let mut graph = ModelGraph::new();
        graph.add_policy(Policy::new("bob", "root", "data2", "read")).unwrap();
        assert!(graph.enforce("bob", "root", "data2", "read"));
        assert!(!graph.enforce("bob", "root", "data2", "write"));
    }

    #[test]
    fn test_exact_match_only() {
        let graph = graph();
        assert!(!graph.enforce("alice", "root", "data*", "write"));
        assert!(!graph.enforce("alice", "root", "DATA1", "write"));
        assert!(!graph.enforce("alice", "root", "data1", "delete"));
    }

    #[test]
    fn test_unknown_inputs_deny() {
        let graph = graph();
        assert!(!graph.enforce("mallory", "root", "data1", "read"));
        assert!(!graph.enforce("alice", "nowhere", "data1", "read"));
        assert!(!graph.enforce("", "", "", ""));
    }

    #[test]
    fn test_subdomain_inherits_parent_grants() {
        let mut graph = graph();
        graph.add_subdomain_link(SubdomainLink::new("root", "team")).unwrap();

        assert!(graph.enforce("alice", "team", "data1", "write"));
        // Parents do not inherit from children
        graph.add_policy(Policy::new("admin", "team", "data9", "write")).unwrap();
        assert!(!graph.enforce("alice", "root", "data9", "write"));
        assert!(graph.enforce("alice", "team", "data9", "write"));
    }

    #[test]
    fn test_child_assignment_uses_parent_policy() {
        let mut graph = ModelGraph::new();
        graph.add_subdomain_link(SubdomainLink::new("root", "team")).unwrap();
        graph.add_policy(Policy::new("admin", "root", "data1", "write")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("carol", "admin", "team")).unwrap();

        assert!(graph.enforce("carol", "team", "data1", "write"));
        assert!(!graph.enforce("carol", "root", "data1", "write"));
    }

    #[test]
    fn test_multi_level_hierarchy() {
        let mut graph = graph();
        graph.add_subdomain_link(SubdomainLink::new("root", "org")).unwrap();
        graph.add_subdomain_link(SubdomainLink::new("org", "team")).unwrap();
        graph.add_subdomain_link(SubdomainLink::new("other", "team")).unwrap();
        graph.add_policy(Policy::new("alice", "other", "report", "read")).unwrap();

        assert!(graph.enforce("alice", "team", "data1", "read"));
        assert!(graph.enforce("alice", "team", "report", "read"));
        assert!(!graph.enforce("alice", "org", "report", "read"));
    }
}
