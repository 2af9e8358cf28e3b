//! Policy Administration operations
//!
//! Each mutation runs under the enforcer's writer lock: apply to a copy of
//! the published graph, persist the effective changes, then publish the
//! copy. A failed store write drops the copy, so un-persisted state is
//! never visible. Changes that would leave the graph as it is skip the
//! store entirely.

use crate::enforcer::Enforcer;
use crate::error::Result;
use crate::model::ModelGraph;
use crate::types::{user_subject, Policy, RoleAssignment, StoreOp, SubdomainLink, Tuple};
use tracing::{debug, info};

impl Enforcer {
    /// Apply `changes` as one logical unit. Returns the number of tuples
    /// that actually changed.
    pub async fn mutate(&self, changes: Vec<(Tuple, StoreOp)>) -> Result<usize> {
        self.mutate_with(|_| changes).await
    }

    /// Like [`Enforcer::mutate`], with the change list derived from the
    /// published graph after the writer lock is held
    pub async fn mutate_with<F>(&self, changes: F) -> Result<usize>
    where
        F: FnOnce(&ModelGraph) -> Vec<(Tuple, StoreOp)>,
    {
        let _guard = self.writer.lock().await;

        let current = self.snapshot();
        let changes = changes(current.as_ref());
        let mut working = (*current).clone();
        let mut effective = Vec::with_capacity(changes.len());
        for (tuple, op) in changes {
            if working.apply(&tuple, op)? {
                effective.push((tuple, op));
            }
        }

        if effective.is_empty() {
            debug!("Mutation left the graph unchanged, skipping store write");
            return Ok(0);
        }

        match effective.as_slice() {
            [(tuple, op)] => self.store.persist(tuple, *op).await?,
            batch => self.store.persist_batch(batch).await?,
        }
        self.publish(working);

        for (tuple, op) in &effective {
            info!(op = ?op, kind = %tuple.kind(), record = %tuple.to_line(), "Tuple persisted");
        }
        Ok(effective.len())
    }

    async fn mutate_one(&self, tuple: Tuple, op: StoreOp) -> Result<bool> {
        Ok(self.mutate(vec![(tuple, op)]).await? > 0)
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    /// Grant `role` (or a literal subject) `action` on `object` in `domain`
    pub async fn add_policy(
        &self,
        role: &str,
        domain: &str,
        object: &str,
        action: &str,
    ) -> Result<bool> {
        self.mutate_one(Policy::new(role, domain, object, action).into(), StoreOp::Add)
            .await
    }

    pub async fn remove_policy(
        &self,
        role: &str,
        domain: &str,
        object: &str,
        action: &str,
    ) -> Result<bool> {
        self.mutate_one(Policy::new(role, domain, object, action).into(), StoreOp::Remove)
            .await
    }

    // ------------------------------------------------------------------
    // Role assignments
    // ------------------------------------------------------------------

    pub async fn add_role_assignment(
        &self,
        subject: &str,
        role: &str,
        domain: &str,
    ) -> Result<bool> {
        self.mutate_one(RoleAssignment::new(subject, role, domain).into(), StoreOp::Add)
            .await
    }

    pub async fn remove_role_assignment(
        &self,
        subject: &str,
        role: &str,
        domain: &str,
    ) -> Result<bool> {
        self.mutate_one(RoleAssignment::new(subject, role, domain).into(), StoreOp::Remove)
            .await
    }

    pub async fn add_user_role(&self, user: &str, role: &str, domain: &str) -> Result<bool> {
        self.add_role_assignment(&user_subject(user), role, domain).await
    }

    pub async fn remove_user_role(&self, user: &str, role: &str, domain: &str) -> Result<bool> {
        self.remove_role_assignment(&user_subject(user), role, domain).await
    }

    // ------------------------------------------------------------------
    // Domains
    // ------------------------------------------------------------------

    /// Declare `child` a subdomain of `parent`
    pub async fn add_subdomain_link(&self, parent: &str, child: &str) -> Result<bool> {
        self.mutate_one(SubdomainLink::new(parent, child).into(), StoreOp::Add)
            .await
    }

    pub async fn remove_subdomain_link(&self, parent: &str, child: &str) -> Result<bool> {
        self.mutate_one(SubdomainLink::new(parent, child).into(), StoreOp::Remove)
            .await
    }

    /// Remove every policy and assignment of `domain` and every subdomain
    /// link touching it, persisted as one batch
    pub async fn delete_domain(&self, domain: &str) -> Result<usize> {
        let removed = self
            .mutate_with(|graph| {
                graph
                    .domain_tuples(domain)
                    .into_iter()
                    .map(|tuple| (tuple, StoreOp::Remove))
                    .collect()
            })
            .await?;
        info!(domain, removed, "Domain deleted");
        Ok(removed)
    }
}
