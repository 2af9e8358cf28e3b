//! In-memory tuple store

use super::TupleStore;
use crate::error::{RbacError, Result};
use crate::types::{StoreOp, Tuple};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Non-persistent store backed by a vector of records.
///
/// Used when no backend is configured and by tests, which can flip it into
/// an unavailable state to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryTupleStore {
    tuples: RwLock<Vec<Tuple>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryTupleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `tuples`, kept in the given order
    pub fn with_tuples(tuples: Vec<Tuple>) -> Self {
        Self {
            tuples: RwLock::new(tuples),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail with `StoreUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful write calls (`persist` or `persist_batch`)
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Append a record directly, bypassing the engine, as an external
    /// writer sharing the store would
    pub fn insert_external(&self, tuple: Tuple) {
        self.tuples.write().push(tuple);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RbacError::StoreUnavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

fn apply(tuples: &mut Vec<Tuple>, tuple: &Tuple, op: StoreOp) {
    match op {
        StoreOp::Add => {
            if !tuples.contains(tuple) {
                tuples.push(tuple.clone());
            }
        }
        StoreOp::Remove => tuples.retain(|t| t != tuple),
    }
}

#[async_trait]
impl TupleStore for MemoryTupleStore {
    async fn load_all(&self) -> Result<Vec<Tuple>> {
        self.check_available()?;
        Ok(self.tuples.read().clone())
    }

    async fn persist(&self, tuple: &Tuple, op: StoreOp) -> Result<()> {
        self.check_available()?;
        apply(&mut self.tuples.write(), tuple, op);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn persist_batch(&self, changes: &[(Tuple, StoreOp)]) -> Result<()> {
        self.check_available()?;
        let mut tuples = self.tuples.write();
        for (tuple, op) in changes {
            apply(&mut tuples, tuple, *op);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
