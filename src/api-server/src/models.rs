use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Policy granted to a role or literal subject within the path domain
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PolicyRequest {
    /// Role name or literal subject
    #[validate(length(min = 1, max = 255))]
    pub subject: String,

    #[validate(length(min = 1, max = 255))]
    pub object: String,

    #[validate(length(min = 1, max = 100))]
    pub action: String,
}

/// Policy for the role named in the path
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RolePolicyRequest {
    #[validate(length(min = 1, max = 255))]
    pub object: String,

    #[validate(length(min = 1, max = 100))]
    pub action: String,
}

/// Role assignment within the path domain
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub subject: String,

    #[validate(length(min = 1, max = 255))]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserRequest {
    /// Stored with a `user:` prefix, which counts against the length limit
    #[validate(length(min = 1, max = 251))]
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RoleRequest {
    #[validate(length(min = 1, max = 255))]
    pub role: String,
}

/// Enforcement query string. Fields are optional so a missing one maps to
/// a 400 with a readable message instead of an extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnforceQuery {
    pub subject: Option<String>,
    pub domain: Option<String>,
    pub object: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnforceResponse {
    pub allowed: bool,
}

/// Tuple counts of the snapshot published by a reload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    pub reloaded: bool,
    pub policies: usize,
    pub assignments: usize,
    pub subdomain_links: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
