//! Tuple store adapters
//!
//! Persistence boundary for policies, role assignments and subdomain
//! links. Adapters hold no business logic: they load every record and
//! apply incremental adds/removes.

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::types::{StoreOp, Tuple};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub mod file;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use file::FileTupleStore;
pub use memory::MemoryTupleStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresTupleStore;

/// Default table name for the relational adapter
pub const DEFAULT_TABLE_NAME: &str = "casbin_rule";

/// Tuple store trait
#[async_trait]
pub trait TupleStore: Send + Sync {
    /// Every persisted tuple, in storage order
    async fn load_all(&self) -> Result<Vec<Tuple>>;

    /// Apply one incremental write
    async fn persist(&self, tuple: &Tuple, op: StoreOp) -> Result<()>;

    /// Apply several writes. Adapters that support it do so atomically.
    async fn persist_batch(&self, changes: &[(Tuple, StoreOp)]) -> Result<()> {
        for (tuple, op) in changes {
            self.persist(tuple, *op).await?;
        }
        Ok(())
    }

    /// Short adapter name for logs
    fn name(&self) -> &'static str;
}

/// Which backing store to open
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    File {
        path: PathBuf,
    },
    #[cfg(feature = "postgres")]
    Postgres {
        database_url: String,
        table_name: String,
        retry: RetryPolicy,
    },
}

impl StoreConfig {
    /// Pick a backend from the deployment settings.
    ///
    /// Development mode always uses `./policy.csv`; otherwise a database
    /// URL wins over a policy file, and with neither the store is an
    /// empty in-memory one.
    #[cfg_attr(not(feature = "postgres"), allow(unused_variables))]
    pub fn select(
        development: bool,
        database_url: Option<String>,
        table_name: Option<String>,
        policy_path: Option<PathBuf>,
        retry: RetryPolicy,
    ) -> Self {
        if development {
            return StoreConfig::File {
                path: PathBuf::from("./policy.csv"),
            };
        }
        match (database_url.filter(|u| !u.is_empty()), policy_path) {
            #[cfg(feature = "postgres")]
            (Some(database_url), _) => StoreConfig::Postgres {
                database_url,
                table_name: table_name.unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
                retry,
            },
            (_, Some(path)) => StoreConfig::File { path },
            _ => StoreConfig::Memory,
        }
    }
}

/// Open the configured store. Connection failures surface as
/// [`crate::RbacError::StoreUnavailable`] after the retry budget is spent.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn TupleStore>> {
    match config {
        StoreConfig::Memory => {
            warn!(
                "No DATABASE_URL or POLICY_PATH configured, using a non-persistent in-memory store"
            );
            Ok(Arc::new(MemoryTupleStore::new()))
        }
        StoreConfig::File { path } => {
            info!(path = %path.display(), "Using file tuple store");
            Ok(Arc::new(FileTupleStore::new(path.clone())))
        }
        #[cfg(feature = "postgres")]
        StoreConfig::Postgres {
            database_url,
            table_name,
            retry,
        } => {
            info!(table = %table_name, "Using PostgreSQL tuple store");
            let store = PostgresTupleStore::connect(database_url, table_name, retry).await?;
            Ok(Arc::new(store))
        }
    }
}
