//! Enforcer context and Reload Coordinator
//!
//! The enforcer owns the currently published [`ModelGraph`] snapshot, the
//! tuple store and the single-writer lock shared by administration
//! mutations and reloads.
//!
//! # Architecture
//!
//! ```text
//! enforce / list ──► snapshot() ──► Arc<ModelGraph> (lock-free load)
//!
//! mutate / reload ──► writer lock ──► build copy ──► store ──► swap
//! ```
//!
//! Readers holding an `Arc` from before a swap finish against that
//! snapshot; the swap itself is one pointer store.

use crate::error::Result;
use crate::model::{GraphStats, ModelGraph};
use crate::store::TupleStore;
use crate::types::{user_subject, Policy, RoleAssignment, SubdomainLink};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Long-lived enforcement context passed to every handler
pub struct Enforcer {
    /// Currently published snapshot
    snapshot: ArcSwap<ModelGraph>,

    /// Serializes administration mutations and reloads
    pub(crate) writer: Mutex<()>,

    /// Persistence backend
    pub(crate) store: Arc<dyn TupleStore>,
}

impl Enforcer {
    /// Load the initial snapshot from `store`.
    ///
    /// Fails when the store cannot be read or holds malformed data; the
    /// caller decides whether that is fatal.
    pub async fn new(store: Arc<dyn TupleStore>) -> Result<Self> {
        let graph = Self::build(store.as_ref()).await?;
        let stats = graph.stats();
        info!(
            store = store.name(),
            policies = stats.policies,
            assignments = stats.assignments,
            subdomain_links = stats.subdomain_links,
            "Enforcer initialized"
        );
        Ok(Self::with_graph(store, graph))
    }

    /// Wrap an already built graph without reading the store
    pub fn with_graph(store: Arc<dyn TupleStore>, graph: ModelGraph) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(graph),
            writer: Mutex::new(()),
            store,
        }
    }

    async fn build(store: &dyn TupleStore) -> Result<ModelGraph> {
        let tuples = store.load_all().await?;
        ModelGraph::from_tuples(tuples)
    }

    /// Current snapshot. Holding the returned `Arc` pins that version.
    pub fn snapshot(&self) -> Arc<ModelGraph> {
        self.snapshot.load_full()
    }

    pub(crate) fn publish(&self, graph: ModelGraph) {
        self.snapshot.store(Arc::new(graph));
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Allow/deny decision against the current snapshot
    pub fn enforce(&self, subject: &str, domain: &str, object: &str, action: &str) -> bool {
        self.snapshot.load().enforce(subject, domain, object, action)
    }

    /// Rebuild the graph from the store and publish it.
    ///
    /// On failure the previous snapshot stays published and the error is
    /// returned.
    pub async fn reload(&self) -> Result<GraphStats> {
        let _guard = self.writer.lock().await;
        let started = Instant::now();

        let graph = match Self::build(self.store.as_ref()).await {
            Ok(graph) => graph,
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    error = %e,
                    "Reload failed, keeping previous snapshot"
                );
                return Err(e);
            }
        };

        let stats = graph.stats();
        self.publish(graph);
        info!(
            policies = stats.policies,
            assignments = stats.assignments,
            subdomain_links = stats.subdomain_links,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot reloaded"
        );
        Ok(stats)
    }

    // Listings read the published snapshot only

    pub fn list_policies(&self, domain: &str, role: &str) -> Vec<Policy> {
        self.snapshot.load().list_policies(domain, role)
    }

    pub fn list_domain_policies(&self, domain: &str) -> Vec<Policy> {
        self.snapshot.load().list_domain_policies(domain)
    }

    pub fn list_roles(&self, domain: &str) -> Vec<String> {
        self.snapshot.load().list_roles(domain)
    }

    pub fn list_subjects_for_role(&self, domain: &str, role: &str) -> Vec<RoleAssignment> {
        self.snapshot.load().list_subjects_for_role(domain, role)
    }

    pub fn list_users_for_role(&self, domain: &str, role: &str) -> Vec<RoleAssignment> {
        self.snapshot.load().list_users_for_role(domain, role)
    }

    pub fn list_roles_for_subject(&self, domain: &str, subject: &str) -> Vec<RoleAssignment> {
        self.snapshot.load().list_roles_for_subject(domain, subject)
    }

    /// Roles held by the user `user` (stored as `user:<user>`)
    pub fn list_roles_for_user(&self, domain: &str, user: &str) -> Vec<RoleAssignment> {
        self.list_roles_for_subject(domain, &user_subject(user))
    }

    pub fn list_subdomains(&self, domain: &str) -> Vec<SubdomainLink> {
        self.snapshot.load().list_subdomains(domain)
    }

    pub fn list_domains(&self) -> Vec<String> {
        self.snapshot.load().list_domains()
    }

    /// Every role reachable from `subject` in `domain` and its ancestors
    pub fn implicit_roles(&self, subject: &str, domain: &str) -> Vec<String> {
        self.snapshot.load().implicit_roles(subject, domain)
    }

    pub fn stats(&self) -> GraphStats {
        self.snapshot.load().stats()
    }
}
