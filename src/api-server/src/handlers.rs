use axum::{
    extract::{Path, Query, State},
    http::Uri,
    Json,
};
use rbac_authz::{Policy, RoleAssignment, SubdomainLink};
use tracing::debug;
use validator::Validate;

use crate::{
    error::{ApiError, Result},
    models::*,
    state::AppState,
};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("missing query parameter '{}'", name))),
    }
}

/// Enforcement decision
#[utoipa::path(
    get,
    path = "/enforce",
    params(EnforceQuery),
    responses(
        (status = 200, description = "Allow/deny decision", body = EnforceResponse),
        (status = 400, description = "Missing parameter", body = ErrorResponse)
    ),
    tag = "enforcement"
)]
pub async fn enforce(
    State(state): State<AppState>,
    Query(query): Query<EnforceQuery>,
) -> Result<Json<EnforceResponse>> {
    let subject = required(query.subject, "subject")?;
    let domain = required(query.domain, "domain")?;
    let object = required(query.object, "object")?;
    let action = required(query.action, "action")?;

    let allowed = state.enforcer.enforce(&subject, &domain, &object, &action);
    Ok(Json(EnforceResponse { allowed }))
}

/// Rebuild the snapshot from the tuple store
#[utoipa::path(
    post,
    path = "/reload",
    responses(
        (status = 200, description = "New snapshot published", body = ReloadResponse),
        (status = 502, description = "Store failure, previous snapshot still serving", body = ErrorResponse)
    ),
    tag = "enforcement"
)]
pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    let stats = state.enforcer.reload().await.map_err(ApiError::ReloadFailed)?;
    Ok(Json(ReloadResponse {
        reloaded: true,
        policies: stats.policies,
        assignments: stats.assignments,
        subdomain_links: stats.subdomain_links,
    }))
}

// ============================================================================
// Domain policies
// ============================================================================

/// Every policy in the domain
#[utoipa::path(
    get,
    path = "/{domain}",
    params(("domain" = String, Path, description = "Domain")),
    responses((status = 200, description = "Domain policies", body = [Policy])),
    tag = "domains"
)]
pub async fn list_domain_policies(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Json<Vec<Policy>> {
    Json(state.enforcer.list_domain_policies(&domain))
}

/// Add a policy to the domain
#[utoipa::path(
    post,
    path = "/{domain}",
    params(("domain" = String, Path, description = "Domain")),
    request_body = PolicyRequest,
    responses(
        (status = 200, description = "Domain policies after the change", body = [Policy]),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Store failure", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn add_domain_policy(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<PolicyRequest>,
) -> Result<Json<Vec<Policy>>> {
    req.validate()?;
    state
        .enforcer
        .add_policy(&req.subject, &domain, &req.object, &req.action)
        .await?;
    Ok(Json(state.enforcer.list_domain_policies(&domain)))
}

/// Remove a policy from the domain
#[utoipa::path(
    delete,
    path = "/{domain}/policy",
    params(("domain" = String, Path, description = "Domain")),
    request_body = PolicyRequest,
    responses(
        (status = 200, description = "Domain policies after the change", body = [Policy]),
        (status = 502, description = "Store failure", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn remove_domain_policy(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<PolicyRequest>,
) -> Result<Json<Vec<Policy>>> {
    req.validate()?;
    state
        .enforcer
        .remove_policy(&req.subject, &domain, &req.object, &req.action)
        .await?;
    Ok(Json(state.enforcer.list_domain_policies(&domain)))
}

/// Delete every tuple scoped to the domain
#[utoipa::path(
    delete,
    path = "/{domain}",
    params(("domain" = String, Path, description = "Domain")),
    responses(
        (status = 200, description = "Domain policies after deletion (empty)", body = [Policy]),
        (status = 502, description = "Store failure", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn delete_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<Vec<Policy>>> {
    state.enforcer.delete_domain(&domain).await?;
    Ok(Json(state.enforcer.list_domain_policies(&domain)))
}

// ============================================================================
// Roles
// ============================================================================

/// Role names used in the domain
#[utoipa::path(
    get,
    path = "/{domain}/role",
    params(("domain" = String, Path, description = "Domain")),
    responses((status = 200, description = "Role names", body = [String])),
    tag = "roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Json<Vec<String>> {
    Json(state.enforcer.list_roles(&domain))
}

/// Assign a role to a subject
#[utoipa::path(
    post,
    path = "/{domain}/role",
    params(("domain" = String, Path, description = "Domain")),
    request_body = AssignmentRequest,
    responses(
        (status = 200, description = "Role names after the change", body = [String]),
        (status = 409, description = "Assignment would close a role cycle", body = ErrorResponse)
    ),
    tag = "roles"
)]
pub async fn add_role(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<Vec<String>>> {
    req.validate()?;
    state
        .enforcer
        .add_role_assignment(&req.subject, &req.role, &domain)
        .await?;
    Ok(Json(state.enforcer.list_roles(&domain)))
}

/// Revoke a role from a subject
#[utoipa::path(
    delete,
    path = "/{domain}/role",
    params(("domain" = String, Path, description = "Domain")),
    request_body = AssignmentRequest,
    responses((status = 200, description = "Role names after the change", body = [String])),
    tag = "roles"
)]
pub async fn remove_role(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<AssignmentRequest>,
) -> Result<Json<Vec<String>>> {
    req.validate()?;
    state
        .enforcer
        .remove_role_assignment(&req.subject, &req.role, &domain)
        .await?;
    Ok(Json(state.enforcer.list_roles(&domain)))
}

// ============================================================================
// Role policies
// ============================================================================

/// Policies granted to the role
#[utoipa::path(
    get,
    path = "/{domain}/role/{role}/policy",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    responses((status = 200, description = "Role policies", body = [Policy])),
    tag = "roles"
)]
pub async fn list_role_policies(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
) -> Json<Vec<Policy>> {
    Json(state.enforcer.list_policies(&domain, &role))
}

/// Grant the role a permission
#[utoipa::path(
    post,
    path = "/{domain}/role/{role}/policy",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    request_body = RolePolicyRequest,
    responses((status = 200, description = "Role policies after the change", body = [Policy])),
    tag = "roles"
)]
pub async fn add_role_policy(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
    Json(req): Json<RolePolicyRequest>,
) -> Result<Json<Vec<Policy>>> {
    req.validate()?;
    state
        .enforcer
        .add_policy(&role, &domain, &req.object, &req.action)
        .await?;
    Ok(Json(state.enforcer.list_policies(&domain, &role)))
}

/// Withdraw a permission from the role
#[utoipa::path(
    delete,
    path = "/{domain}/role/{role}/policy",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    request_body = RolePolicyRequest,
    responses((status = 200, description = "Role policies after the change", body = [Policy])),
    tag = "roles"
)]
pub async fn remove_role_policy(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
    Json(req): Json<RolePolicyRequest>,
) -> Result<Json<Vec<Policy>>> {
    req.validate()?;
    state
        .enforcer
        .remove_policy(&role, &domain, &req.object, &req.action)
        .await?;
    Ok(Json(state.enforcer.list_policies(&domain, &role)))
}

// ============================================================================
// Role members
// ============================================================================

/// Subjects holding the role
#[utoipa::path(
    get,
    path = "/{domain}/role/{role}/subject",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    responses((status = 200, description = "Assignments of the role", body = [RoleAssignment])),
    tag = "roles"
)]
pub async fn list_role_subjects(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
) -> Json<Vec<RoleAssignment>> {
    Json(state.enforcer.list_subjects_for_role(&domain, &role))
}

#[utoipa::path(
    post,
    path = "/{domain}/role/{role}/subject",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    request_body = SubjectRequest,
    responses((status = 200, description = "Assignments after the change", body = [RoleAssignment])),
    tag = "roles"
)]
pub async fn add_role_subject(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
    Json(req): Json<SubjectRequest>,
) -> Result<Json<Vec<RoleAssignment>>> {
    req.validate()?;
    state
        .enforcer
        .add_role_assignment(&req.subject, &role, &domain)
        .await?;
    Ok(Json(state.enforcer.list_subjects_for_role(&domain, &role)))
}

#[utoipa::path(
    delete,
    path = "/{domain}/role/{role}/subject",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    request_body = SubjectRequest,
    responses((status = 200, description = "Assignments after the change", body = [RoleAssignment])),
    tag = "roles"
)]
pub async fn remove_role_subject(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
    Json(req): Json<SubjectRequest>,
) -> Result<Json<Vec<RoleAssignment>>> {
    req.validate()?;
    state
        .enforcer
        .remove_role_assignment(&req.subject, &role, &domain)
        .await?;
    Ok(Json(state.enforcer.list_subjects_for_role(&domain, &role)))
}

/// Users holding the role
#[utoipa::path(
    get,
    path = "/{domain}/role/{role}/user",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    responses((status = 200, description = "User assignments of the role", body = [RoleAssignment])),
    tag = "roles"
)]
pub async fn list_role_users(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
) -> Json<Vec<RoleAssignment>> {
    Json(state.enforcer.list_users_for_role(&domain, &role))
}

#[utoipa::path(
    post,
    path = "/{domain}/role/{role}/user",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    request_body = UserRequest,
    responses((status = 200, description = "User assignments after the change", body = [RoleAssignment])),
    tag = "roles"
)]
pub async fn add_role_user(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
    Json(req): Json<UserRequest>,
) -> Result<Json<Vec<RoleAssignment>>> {
    req.validate()?;
    state.enforcer.add_user_role(&req.user, &role, &domain).await?;
    Ok(Json(state.enforcer.list_users_for_role(&domain, &role)))
}

#[utoipa::path(
    delete,
    path = "/{domain}/role/{role}/user",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("role" = String, Path, description = "Role")
    ),
    request_body = UserRequest,
    responses((status = 200, description = "User assignments after the change", body = [RoleAssignment])),
    tag = "roles"
)]
pub async fn remove_role_user(
    State(state): State<AppState>,
    Path((domain, role)): Path<(String, String)>,
    Json(req): Json<UserRequest>,
) -> Result<Json<Vec<RoleAssignment>>> {
    req.validate()?;
    state.enforcer.remove_user_role(&req.user, &role, &domain).await?;
    Ok(Json(state.enforcer.list_users_for_role(&domain, &role)))
}

// ============================================================================
// Subject roles
// ============================================================================

/// Roles held directly by the subject
#[utoipa::path(
    get,
    path = "/{domain}/subject/{subject}/role",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("subject" = String, Path, description = "Subject")
    ),
    responses((status = 200, description = "Assignments of the subject", body = [RoleAssignment])),
    tag = "subjects"
)]
pub async fn list_subject_roles(
    State(state): State<AppState>,
    Path((domain, subject)): Path<(String, String)>,
) -> Json<Vec<RoleAssignment>> {
    Json(state.enforcer.list_roles_for_subject(&domain, &subject))
}

#[utoipa::path(
    post,
    path = "/{domain}/subject/{subject}/role",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("subject" = String, Path, description = "Subject")
    ),
    request_body = RoleRequest,
    responses((status = 200, description = "Assignments after the change", body = [RoleAssignment])),
    tag = "subjects"
)]
pub async fn add_subject_role(
    State(state): State<AppState>,
    Path((domain, subject)): Path<(String, String)>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<Vec<RoleAssignment>>> {
    req.validate()?;
    state
        .enforcer
        .add_role_assignment(&subject, &req.role, &domain)
        .await?;
    Ok(Json(state.enforcer.list_roles_for_subject(&domain, &subject)))
}

#[utoipa::path(
    delete,
    path = "/{domain}/subject/{subject}/role",
    params(
        ("domain" = String, Path, description = "Domain"),
        ("subject" = String, Path, description = "Subject")
    ),
    request_body = RoleRequest,
    responses((status = 200, description = "Assignments after the change", body = [RoleAssignment])),
    tag = "subjects"
)]
pub async fn remove_subject_role(
    State(state): State<AppState>,
    Path((domain, subject)): Path<(String, String)>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<Vec<RoleAssignment>>> {
    req.validate()?;
    state
        .enforcer
        .remove_role_assignment(&subject, &req.role, &domain)
        .await?;
    Ok(Json(state.enforcer.list_roles_for_subject(&domain, &subject)))
}

// ============================================================================
// Subdomains
// ============================================================================

/// Direct subdomains of the domain
#[utoipa::path(
    get,
    path = "/{domain}/subdomain",
    params(("domain" = String, Path, description = "Domain")),
    responses((status = 200, description = "Subdomain links", body = [SubdomainLink])),
    tag = "domains"
)]
pub async fn list_subdomains(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Json<Vec<SubdomainLink>> {
    Json(state.enforcer.list_subdomains(&domain))
}

/// The link between the domain and the subdomain, if present
#[utoipa::path(
    get,
    path = "/{domain}/subdomain/{subdomain}",
    params(
        ("domain" = String, Path, description = "Parent domain"),
        ("subdomain" = String, Path, description = "Child domain")
    ),
    responses((status = 200, description = "Zero or one link", body = [SubdomainLink])),
    tag = "domains"
)]
pub async fn get_subdomain(
    State(state): State<AppState>,
    Path((domain, subdomain)): Path<(String, String)>,
) -> Json<Vec<SubdomainLink>> {
    let links = state
        .enforcer
        .list_subdomains(&domain)
        .into_iter()
        .filter(|link| link.child == subdomain)
        .collect();
    Json(links)
}

#[utoipa::path(
    post,
    path = "/{domain}/subdomain/{subdomain}",
    params(
        ("domain" = String, Path, description = "Parent domain"),
        ("subdomain" = String, Path, description = "Child domain")
    ),
    responses(
        (status = 200, description = "Subdomain links after the change", body = [SubdomainLink]),
        (status = 409, description = "Link would create a cycle", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn add_subdomain(
    State(state): State<AppState>,
    Path((domain, subdomain)): Path<(String, String)>,
) -> Result<Json<Vec<SubdomainLink>>> {
    state.enforcer.add_subdomain_link(&domain, &subdomain).await?;
    Ok(Json(state.enforcer.list_subdomains(&domain)))
}

#[utoipa::path(
    delete,
    path = "/{domain}/subdomain/{subdomain}",
    params(
        ("domain" = String, Path, description = "Parent domain"),
        ("subdomain" = String, Path, description = "Child domain")
    ),
    responses((status = 200, description = "Subdomain links after the change", body = [SubdomainLink])),
    tag = "domains"
)]
pub async fn remove_subdomain(
    State(state): State<AppState>,
    Path((domain, subdomain)): Path<(String, String)>,
) -> Result<Json<Vec<SubdomainLink>>> {
    state.enforcer.remove_subdomain_link(&domain, &subdomain).await?;
    Ok(Json(state.enforcer.list_subdomains(&domain)))
}

/// Unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    debug!(%uri, "No route");
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
