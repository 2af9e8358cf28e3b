//! Error types for the RBAC engine

use thiserror::Error;

/// RBAC engine errors
#[derive(Debug, Error)]
pub enum RbacError {
    /// Referenced domain, role or subject has no tuples
    #[error("Not found: {0}")]
    NotFound(String),

    /// A subdomain link or role assignment would close a cycle
    #[error("Cycle detected: {0}")]
    Cycle(String),

    /// The tuple store could not be reached or failed mid-operation
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Malformed tuple fields or records
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl RbacError {
    /// Whether the error came from the persistence boundary
    pub fn is_store_failure(&self) -> bool {
        matches!(self, RbacError::StoreUnavailable(_))
    }
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;
