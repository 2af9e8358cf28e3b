//! HTTP surface for the domain RBAC engine
//!
//! Axum router over the enforcer's administration, enforcement and reload
//! operations, with OpenAPI documentation.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use config::Args;
pub use error::{ApiError, Result};
pub use server::{Server, ServerBuilder, ServerConfig};
pub use state::AppState;
