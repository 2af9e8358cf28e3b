//! Flat-file tuple store
//!
//! One record per line, tag first, fields comma separated:
//!
//! ```text
//! p, admin, root, data1, write
//! g, alice, admin, root
//! g2, team, root
//! ```
//!
//! Blank lines and `#` comments are ignored on load. Every write rewrites
//! the file through a temporary sibling and a rename, so readers never see
//! a half-written file.

use super::TupleStore;
use crate::error::{RbacError, Result};
use crate::types::{StoreOp, Tuple};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

pub struct FileTupleStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl FileTupleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_tuples(&self) -> Result<Vec<Tuple>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => parse_records(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(RbacError::StoreUnavailable(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_tuples(&self, tuples: &[Tuple]) -> Result<()> {
        let mut contents = String::new();
        for tuple in tuples {
            contents.push_str(&tuple.to_line());
            contents.push('\n');
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let unavailable = |e: std::io::Error| {
            RbacError::StoreUnavailable(format!("failed to write {}: {}", self.path.display(), e))
        };
        tokio::fs::write(&tmp, contents).await.map_err(unavailable)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(unavailable)?;

        debug!(path = %self.path.display(), records = tuples.len(), "Policy file rewritten");
        Ok(())
    }

    async fn rewrite_with(&self, changes: &[(Tuple, StoreOp)]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tuples = self.read_tuples().await?;
        let mut changed = false;
        for (tuple, op) in changes {
            match op {
                StoreOp::Add if !tuples.contains(tuple) => {
                    tuples.push(tuple.clone());
                    changed = true;
                }
                StoreOp::Remove if tuples.contains(tuple) => {
                    tuples.retain(|t| t != tuple);
                    changed = true;
                }
                _ => {}
            }
        }
        if changed {
            self.write_tuples(&tuples).await?;
        }
        Ok(())
    }
}

/// Parse the line-oriented record format
pub fn parse_records(contents: &str) -> Result<Vec<Tuple>> {
    let mut tuples = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split(',').map(str::trim);
        let tag = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();
        let tuple = Tuple::from_record(tag, &fields).map_err(|e| {
            RbacError::Validation(format!("line {}: {}", index + 1, e))
        })?;
        tuples.push(tuple);
    }
    Ok(tuples)
}

#[async_trait]
impl TupleStore for FileTupleStore {
    async fn load_all(&self) -> Result<Vec<Tuple>> {
        self.read_tuples().await
    }

    async fn persist(&self, tuple: &Tuple, op: StoreOp) -> Result<()> {
        self.rewrite_with(&[(tuple.clone(), op)]).await
    }

    async fn persist_batch(&self, changes: &[(Tuple, StoreOp)]) -> Result<()> {
        self.rewrite_with(changes).await
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
