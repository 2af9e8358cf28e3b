//! # Domain RBAC Engine
//!
//! Multi-tenant role-based access control with role inheritance and
//! subdomain inheritance.
//!
//! ## Features
//!
//! - **Model graph** of domains, roles, role assignments and policies
//! - **Enforcement** with transitive role hierarchy and ancestor domains
//! - **Administration** operations that persist before they publish
//! - **Hot reload** through an atomic snapshot swap
//! - **Pluggable tuple stores**: memory, flat file, PostgreSQL
//!
//! ## Example
//!
//! ```rust
//! use rbac_authz::{Enforcer, MemoryTupleStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let enforcer = Enforcer::new(Arc::new(MemoryTupleStore::new())).await?;
//!
//!     enforcer.add_policy("admin", "root", "data1", "write").await?;
//!     assert!(!enforcer.enforce("alice", "root", "data1", "write"));
//!
//!     enforcer.add_role_assignment("alice", "admin", "root").await?;
//!     assert!(enforcer.enforce("alice", "root", "data1", "write"));
//!
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod enforcer;
pub mod error;
pub mod model;
pub mod retry;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use enforcer::Enforcer;
pub use error::{RbacError, Result};
pub use model::{GraphStats, ModelGraph};
pub use retry::{retry, RetryPolicy};
pub use store::{open_store, FileTupleStore, MemoryTupleStore, StoreConfig, TupleStore};
#[cfg(feature = "postgres")]
pub use store::PostgresTupleStore;
pub use types::{
    Policy, RoleAssignment, StoreOp, SubdomainLink, Tuple, TupleKind, MAX_IDENTIFIER_LEN,
    USER_PREFIX,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
