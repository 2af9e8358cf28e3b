//! Route definitions for the API server
//!
//! The resource hierarchy is rooted at the domain path segment:
//! `/{domain}`, `/{domain}/role`, `/{domain}/role/{role}/policy`,
//! `/{domain}/role/{role}/subject`, `/{domain}/role/{role}/user`,
//! `/{domain}/subject/{subject}/role`, `/{domain}/subdomain/{subdomain}`.
//! Fixed paths (`/health`, `/enforce`, `/reload`, `/api-docs/...`) take
//! precedence over the domain segment.

use crate::{handlers, middleware, models, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Domain RBAC API",
        description = "Multi-tenant RBAC enforcement and policy administration",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        handlers::health_check,
        handlers::enforce,
        handlers::reload,
        handlers::list_domain_policies,
        handlers::add_domain_policy,
        handlers::remove_domain_policy,
        handlers::delete_domain,
        handlers::list_roles,
        handlers::add_role,
        handlers::remove_role,
        handlers::list_role_policies,
        handlers::add_role_policy,
        handlers::remove_role_policy,
        handlers::list_role_subjects,
        handlers::add_role_subject,
        handlers::remove_role_subject,
        handlers::list_role_users,
        handlers::add_role_user,
        handlers::remove_role_user,
        handlers::list_subject_roles,
        handlers::add_subject_role,
        handlers::remove_subject_role,
        handlers::list_subdomains,
        handlers::get_subdomain,
        handlers::add_subdomain,
        handlers::remove_subdomain,
    ),
    components(
        schemas(
            rbac_authz::Policy,
            rbac_authz::RoleAssignment,
            rbac_authz::SubdomainLink,
            models::PolicyRequest,
            models::RolePolicyRequest,
            models::AssignmentRequest,
            models::SubjectRequest,
            models::UserRequest,
            models::RoleRequest,
            models::EnforceResponse,
            models::ReloadResponse,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "enforcement", description = "Access decisions and snapshot reload"),
        (name = "domains", description = "Domain policies and subdomain links"),
        (name = "roles", description = "Role policies and role members"),
        (name = "subjects", description = "Roles held by a subject"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Fixed paths
        .route("/health", get(handlers::health_check))
        .route("/enforce", get(handlers::enforce))
        .route("/reload", post(handlers::reload))
        .route("/api-docs/openapi.json", get(openapi_json))
        // Domain policies
        .route(
            "/:domain",
            get(handlers::list_domain_policies)
                .post(handlers::add_domain_policy)
                .delete(handlers::delete_domain),
        )
        .route(
            "/:domain/policy",
            get(handlers::list_domain_policies)
                .post(handlers::add_domain_policy)
                .delete(handlers::remove_domain_policy),
        )
        // Roles
        .route(
            "/:domain/role",
            get(handlers::list_roles)
                .post(handlers::add_role)
                .delete(handlers::remove_role),
        )
        .route(
            "/:domain/role/:role/policy",
            get(handlers::list_role_policies)
                .post(handlers::add_role_policy)
                .delete(handlers::remove_role_policy),
        )
        .route(
            "/:domain/role/:role/subject",
            get(handlers::list_role_subjects)
                .post(handlers::add_role_subject)
                .delete(handlers::remove_role_subject),
        )
        .route(
            "/:domain/role/:role/user",
            get(handlers::list_role_users)
                .post(handlers::add_role_user)
                .delete(handlers::remove_role_user),
        )
        // Subjects
        .route(
            "/:domain/subject/:subject/role",
            get(handlers::list_subject_roles)
                .post(handlers::add_subject_role)
                .delete(handlers::remove_subject_role),
        )
        // Subdomains
        .route("/:domain/subdomain", get(handlers::list_subdomains))
        .route(
            "/:domain/subdomain/:subdomain",
            get(handlers::get_subdomain)
                .post(handlers::add_subdomain)
                .delete(handlers::remove_subdomain),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        // Middleware layers (executed bottom to top)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}
