//! In-memory model graph
//!
//! Holds every policy, role assignment and subdomain link of one snapshot,
//! plus the adjacency maps the enforcement path walks. Listing order is
//! insertion order; lookups go through hash indexes.

mod resolve;

use crate::error::{RbacError, Result};
use crate::types::{Policy, RoleAssignment, StoreOp, SubdomainLink, Tuple, USER_PREFIX};
use std::collections::{HashMap, HashSet, VecDeque};

/// domain -> subject -> roles held in that domain
type RoleEdges = HashMap<String, HashMap<String, Vec<String>>>;

/// One consistent version of all domains, roles, assignments and policies
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    policies: Vec<Policy>,
    policy_index: HashSet<Policy>,

    assignments: Vec<RoleAssignment>,
    assignment_index: HashSet<RoleAssignment>,
    role_edges: RoleEdges,

    links: Vec<SubdomainLink>,
    link_index: HashSet<SubdomainLink>,
    /// child -> parents
    parents: HashMap<String, Vec<String>>,
}

/// Tuple counts of a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GraphStats {
    pub policies: usize,
    pub assignments: usize,
    pub subdomain_links: usize,
}

impl ModelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from persisted tuples, applying the same checks as
    /// live mutations. Duplicates collapse; a cycle or malformed tuple
    /// fails the whole build.
    pub fn from_tuples<I>(tuples: I) -> Result<Self>
    where
        I: IntoIterator<Item = Tuple>,
    {
        let mut graph = Self::new();
        for tuple in tuples {
            graph.apply(&tuple, StoreOp::Add)?;
        }
        Ok(graph)
    }

    /// Apply one tuple change. Returns whether the graph changed.
    pub fn apply(&mut self, tuple: &Tuple, op: StoreOp) -> Result<bool> {
        match (tuple, op) {
            (Tuple::Policy(p), StoreOp::Add) => self.add_policy(p.clone()),
            (Tuple::Policy(p), StoreOp::Remove) => Ok(self.remove_policy(p)),
            (Tuple::Assignment(a), StoreOp::Add) => self.add_role_assignment(a.clone()),
            (Tuple::Assignment(a), StoreOp::Remove) => Ok(self.remove_role_assignment(a)),
            (Tuple::Subdomain(l), StoreOp::Add) => self.add_subdomain_link(l.clone()),
            (Tuple::Subdomain(l), StoreOp::Remove) => Ok(self.remove_subdomain_link(l)),
        }
    }

    /// Whether the tuple is present
    pub fn contains(&self, tuple: &Tuple) -> bool {
        match tuple {
            Tuple::Policy(p) => self.policy_index.contains(p),
            Tuple::Assignment(a) => self.assignment_index.contains(a),
            Tuple::Subdomain(l) => self.link_index.contains(l),
        }
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    /// Insert a policy; duplicate insert is a no-op
    pub fn add_policy(&mut self, policy: Policy) -> Result<bool> {
        policy.validate()?;
        if self.policy_index.contains(&policy) {
            return Ok(false);
        }
        self.policy_index.insert(policy.clone());
        self.policies.push(policy);
        Ok(true)
    }

    /// Remove a policy; removing an absent policy is a no-op
    pub fn remove_policy(&mut self, policy: &Policy) -> bool {
        if !self.policy_index.remove(policy) {
            return false;
        }
        self.policies.retain(|p| p != policy);
        true
    }

    /// Policies granted to `role` (or a literal subject) in `domain`
    pub fn list_policies(&self, domain: &str, role: &str) -> Vec<Policy> {
        self.policies
            .iter()
            .filter(|p| p.domain == domain && p.subject == role)
            .cloned()
            .collect()
    }

    /// Every policy scoped to `domain`
    pub fn list_domain_policies(&self, domain: &str) -> Vec<Policy> {
        self.policies
            .iter()
            .filter(|p| p.domain == domain)
            .cloned()
            .collect()
    }

    pub(crate) fn has_policy(
        &self,
        subject: &str,
        domain: &str,
        object: &str,
        action: &str,
    ) -> bool {
        self.policy_index
            .contains(&Policy::new(subject, domain, object, action))
    }

    // ------------------------------------------------------------------
    // Role assignments
    // ------------------------------------------------------------------

    /// Grant `role` to `subject` in `domain`; duplicate grant is a no-op.
    ///
    /// Fails with [`RbacError::Cycle`] when `subject` is a role that `role`
    /// already inherits from in the same domain.
    pub fn add_role_assignment(&mut self, assignment: RoleAssignment) -> Result<bool> {
        assignment.validate()?;
        if self.assignment_index.contains(&assignment) {
            return Ok(false);
        }
        if self.role_reaches(&assignment.domain, &assignment.role, &assignment.subject) {
            return Err(RbacError::Cycle(format!(
                "role '{}' already inherits from '{}' in domain '{}'",
                assignment.role, assignment.subject, assignment.domain
            )));
        }

        self.role_edges
            .entry(assignment.domain.clone())
            .or_default()
            .entry(assignment.subject.clone())
            .or_default()
            .push(assignment.role.clone());
        self.assignment_index.insert(assignment.clone());
        self.assignments.push(assignment);
        Ok(true)
    }

    /// Revoke an assignment; revoking an absent one is a no-op
    pub fn remove_role_assignment(&mut self, assignment: &RoleAssignment) -> bool {
        if !self.assignment_index.remove(assignment) {
            return false;
        }
        self.assignments.retain(|a| a != assignment);

        if let Some(subjects) = self.role_edges.get_mut(&assignment.domain) {
            if let Some(roles) = subjects.get_mut(&assignment.subject) {
                roles.retain(|r| r != &assignment.role);
                if roles.is_empty() {
                    subjects.remove(&assignment.subject);
                }
            }
            if subjects.is_empty() {
                self.role_edges.remove(&assignment.domain);
            }
        }
        true
    }

    /// Assignments of `role` in `domain`
    pub fn list_subjects_for_role(&self, domain: &str, role: &str) -> Vec<RoleAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.domain == domain && a.role == role)
            .cloned()
            .collect()
    }

    /// Assignments of `role` in `domain` whose subject is a person-type principal
    pub fn list_users_for_role(&self, domain: &str, role: &str) -> Vec<RoleAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.domain == domain && a.role == role && a.subject.starts_with(USER_PREFIX))
            .cloned()
            .collect()
    }

    /// Roles held directly by `subject` in `domain`
    pub fn list_roles_for_subject(&self, domain: &str, subject: &str) -> Vec<RoleAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.domain == domain && a.subject == subject)
            .cloned()
            .collect()
    }

    /// Distinct role names in `domain`, first-appearance order: every
    /// assigned role, then every policy subject that is not a person-type
    /// principal
    pub fn list_roles(&self, domain: &str) -> Vec<String> {
        let assigned = self
            .assignments
            .iter()
            .filter(|a| a.domain == domain)
            .map(|a| a.role.as_str());
        let granted = self
            .policies
            .iter()
            .filter(|p| p.domain == domain && !p.subject.starts_with(USER_PREFIX))
            .map(|p| p.subject.as_str());

        let mut seen = HashSet::new();
        let mut roles = Vec::new();
        for role in assigned.chain(granted) {
            if seen.insert(role) {
                roles.push(role.to_string());
            }
        }
        roles
    }

    fn direct_roles<'a>(&'a self, domain: &str, subject: &str) -> &'a [String] {
        self.role_edges
            .get(domain)
            .and_then(|subjects| subjects.get(subject))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `from` inherits `target` through assignments inside `domain`
    fn role_reaches(&self, domain: &str, from: &str, target: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for role in self.direct_roles(domain, current) {
                queue.push_back(role.as_str());
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Domains
    // ------------------------------------------------------------------

    /// Declare `child` a subdomain of `parent`; an existing link is a no-op.
    ///
    /// Fails with [`RbacError::Cycle`] when `child` is already `parent`
    /// or one of its ancestors.
    pub fn add_subdomain_link(&mut self, link: SubdomainLink) -> Result<bool> {
        link.validate()?;
        if self.link_index.contains(&link) {
            return Ok(false);
        }
        if self.ancestors(&link.parent).iter().any(|d| d == &link.child) {
            return Err(RbacError::Cycle(format!(
                "'{}' is already an ancestor of '{}'",
                link.child, link.parent
            )));
        }

        self.parents
            .entry(link.child.clone())
            .or_default()
            .push(link.parent.clone());
        self.link_index.insert(link.clone());
        self.links.push(link);
        Ok(true)
    }

    /// Remove a subdomain link; removing an absent link is a no-op
    pub fn remove_subdomain_link(&mut self, link: &SubdomainLink) -> bool {
        if !self.link_index.remove(link) {
            return false;
        }
        self.links.retain(|l| l != link);
        if let Some(parents) = self.parents.get_mut(&link.child) {
            parents.retain(|p| p != &link.parent);
            if parents.is_empty() {
                self.parents.remove(&link.child);
            }
        }
        true
    }

    pub fn has_subdomain_link(&self, link: &SubdomainLink) -> bool {
        self.link_index.contains(link)
    }

    /// Direct subdomains of `domain`
    pub fn list_subdomains(&self, domain: &str) -> Vec<SubdomainLink> {
        self.links
            .iter()
            .filter(|l| l.parent == domain)
            .cloned()
            .collect()
    }

    /// Every domain referenced by any tuple, first-appearance order
    pub fn list_domains(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut domains = Vec::new();
        let referenced = self
            .policies
            .iter()
            .map(|p| p.domain.as_str())
            .chain(self.assignments.iter().map(|a| a.domain.as_str()))
            .chain(
                self.links
                    .iter()
                    .flat_map(|l| [l.parent.as_str(), l.child.as_str()]),
            );
        for domain in referenced {
            if seen.insert(domain) {
                domains.push(domain.to_string());
            }
        }
        domains
    }

    /// Every tuple scoped to `domain`: its policies, its assignments and
    /// each subdomain link that touches it
    pub fn domain_tuples(&self, domain: &str) -> Vec<Tuple> {
        let policies = self
            .policies
            .iter()
            .filter(|p| p.domain == domain)
            .cloned()
            .map(Tuple::Policy);
        let assignments = self
            .assignments
            .iter()
            .filter(|a| a.domain == domain)
            .cloned()
            .map(Tuple::Assignment);
        let links = self
            .links
            .iter()
            .filter(|l| l.parent == domain || l.child == domain)
            .cloned()
            .map(Tuple::Subdomain);
        policies.chain(assignments).chain(links).collect()
    }

    /// All tuples in insertion order per kind
    pub fn tuples(&self) -> Vec<Tuple> {
        self.policies
            .iter()
            .cloned()
            .map(Tuple::Policy)
            .chain(self.assignments.iter().cloned().map(Tuple::Assignment))
            .chain(self.links.iter().cloned().map(Tuple::Subdomain))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            policies: self.policies.len(),
            assignments: self.assignments.len(),
            subdomain_links: self.links.len(),
        }
    }

    /// `domain` followed by every ancestor reachable through subdomain
    /// links, breadth first. The visited set bounds the walk even if the
    /// link data were cyclic.
    pub fn ancestors(&self, domain: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([domain]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current.to_string());
            if let Some(parents) = self.parents.get(current) {
                queue.extend(parents.iter().map(String::as_str));
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_policy_idempotent() {
        let mut graph = ModelGraph::new();
        let policy = Policy::new("admin", "root", "data1", "write");

        assert!(graph.add_policy(policy.clone()).unwrap());
        assert!(!graph.add_policy(policy.clone()).unwrap());
        assert_eq!(graph.list_policies("root", "admin"), vec![policy]);
    }

    #[test]
    fn test_remove_absent_policy_is_noop() {
        let mut graph = ModelGraph::new();
        assert!(!graph.remove_policy(&Policy::new("admin", "root", "data1", "write")));
        assert_eq!(graph.stats(), GraphStats::default());
    }

    #[test]
    fn test_policy_listing_keeps_insertion_order() {
        let mut graph = ModelGraph::new();
        graph.add_policy(Policy::new("admin", "root", "b", "write")).unwrap();
        graph.add_policy(Policy::new("admin", "root", "a", "read")).unwrap();
        graph.add_policy(Policy::new("viewer", "root", "a", "read")).unwrap();

        let objects: Vec<_> = graph
            .list_policies("root", "admin")
            .into_iter()
            .map(|p| p.object)
            .collect();
        assert_eq!(objects, vec!["b", "a"]);
        assert_eq!(graph.list_domain_policies("root").len(), 3);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut graph = ModelGraph::new();
        let result = graph.add_policy(Policy::new("", "root", "data1", "write"));
        assert!(matches!(result, Err(RbacError::Validation(_))));
        assert_eq!(graph.stats().policies, 0);
    }

    #[test]
    fn test_role_assignment_listing() {
        let mut graph = ModelGraph::new();
        graph.add_role_assignment(RoleAssignment::new("alice", "admin", "root")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("user:bob", "admin", "root")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("alice", "viewer", "root")).unwrap();

        assert_eq!(graph.list_subjects_for_role("root", "admin").len(), 2);
        assert_eq!(graph.list_users_for_role("root", "admin").len(), 1);
        let roles: Vec<_> = graph
            .list_roles_for_subject("root", "alice")
            .into_iter()
            .map(|a| a.role)
            .collect();
        assert_eq!(roles, vec!["admin", "viewer"]);
    }

    #[test]
    fn test_remove_role_assignment_cleans_edges() {
        let mut graph = ModelGraph::new();
        let assignment = RoleAssignment::new("alice", "admin", "root");
        graph.add_role_assignment(assignment.clone()).unwrap();
        assert!(graph.remove_role_assignment(&assignment));
        assert!(!graph.remove_role_assignment(&assignment));
        assert!(graph.role_edges.is_empty());
    }

    #[test]
    fn test_role_cycle_rejected() {
        let mut graph = ModelGraph::new();
        graph.add_role_assignment(RoleAssignment::new("admin", "editor", "root")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("editor", "viewer", "root")).unwrap();

        let result = graph.add_role_assignment(RoleAssignment::new("viewer", "admin", "root"));
        assert!(matches!(result, Err(RbacError::Cycle(_))));

        // Same names in another domain are distinct roles
        graph.add_role_assignment(RoleAssignment::new("viewer", "admin", "other")).unwrap();
    }

    #[test]
    fn test_subdomain_cycle_rejected() {
        let mut graph = ModelGraph::new();
        graph.add_subdomain_link(SubdomainLink::new("a", "b")).unwrap();
        let before = graph.stats();

        let result = graph.add_subdomain_link(SubdomainLink::new("b", "a"));
        assert!(matches!(result, Err(RbacError::Cycle(_))));
        assert_eq!(graph.stats(), before);

        let result = graph.add_subdomain_link(SubdomainLink::new("c", "c"));
        assert!(matches!(result, Err(RbacError::Cycle(_))));
    }

    #[test]
    fn test_transitive_subdomain_cycle_rejected() {
        let mut graph = ModelGraph::new();
        graph.add_subdomain_link(SubdomainLink::new("root", "org")).unwrap();
        graph.add_subdomain_link(SubdomainLink::new("org", "team")).unwrap();

        let result = graph.add_subdomain_link(SubdomainLink::new("team", "root"));
        assert!(matches!(result, Err(RbacError::Cycle(_))));
        assert_eq!(graph.ancestors("team"), vec!["team", "org", "root"]);
    }

    #[test]
    fn test_list_roles_and_domains() {
        let mut graph = ModelGraph::new();
        graph.add_policy(Policy::new("admin", "root", "data1", "write")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("alice", "viewer", "root")).unwrap();
        graph.add_policy(Policy::new("viewer", "root", "data1", "read")).unwrap();
        graph.add_subdomain_link(SubdomainLink::new("root", "team")).unwrap();

        assert_eq!(graph.list_roles("root"), vec!["viewer", "admin"]);
        assert_eq!(graph.list_domains(), vec!["root", "team"]);
        assert_eq!(graph.list_subdomains("root"), vec![SubdomainLink::new("root", "team")]);
        assert!(graph.list_subdomains("team").is_empty());
    }

    #[test]
    fn test_domain_tuples() {
        let mut graph = ModelGraph::new();
        graph.add_policy(Policy::new("admin", "root", "data1", "write")).unwrap();
        graph.add_policy(Policy::new("admin", "other", "data1", "write")).unwrap();
        graph.add_role_assignment(RoleAssignment::new("alice", "admin", "root")).unwrap();
        graph.add_subdomain_link(SubdomainLink::new("root", "team")).unwrap();

        assert_eq!(graph.domain_tuples("root").len(), 3);
        assert_eq!(graph.domain_tuples("team").len(), 1);
    }

    #[test]
    fn test_from_tuples_rejects_cycles() {
        let tuples = vec![
            Tuple::Subdomain(SubdomainLink::new("a", "b")),
            Tuple::Subdomain(SubdomainLink::new("b", "a")),
        ];
        assert!(matches!(ModelGraph::from_tuples(tuples), Err(RbacError::Cycle(_))));
    }

    #[test]
    fn test_walks_terminate_on_cyclic_adjacency() {
        let mut graph = ModelGraph::new();
        graph.add_policy(Policy::new("admin", "a", "data1", "read")).unwrap();
        graph.add_policy(Policy::new("admin", "elsewhere", "data2", "write")).unwrap();
        // bypass the link and assignment checks to plant cycles
        graph.parents.insert("a".into(), vec!["b".into()]);
        graph.parents.insert("b".into(), vec!["a".into()]);
        let roles = graph.role_edges.entry("a".into()).or_default();
        roles.insert("alice".into(), vec!["editor".into()]);
        roles.insert("editor".into(), vec!["admin".into()]);
        roles.insert("admin".into(), vec!["editor".into()]);

        assert_eq!(graph.ancestors("a"), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(graph.ancestors("b"), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(
            graph.implicit_roles("alice", "b"),
            vec!["editor".to_string(), "admin".to_string()]
        );

        assert!(graph.enforce("alice", "b", "data1", "read"));
        assert!(!graph.enforce("alice", "b", "data2", "write"));
        assert!(!graph.enforce("alice", "a", "data1", "write"));
        assert!(!graph.enforce("mallory", "a", "data1", "read"));
    }
}
