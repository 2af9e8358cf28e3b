use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::models::ErrorResponse;
use rbac_authz::RbacError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Rbac(#[from] RbacError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any failure rebuilding the snapshot; the old one keeps serving
    #[error("Reload failed: {0}")]
    ReloadFailed(RbacError),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rbac(RbacError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Rbac(RbacError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Rbac(RbacError::Cycle(_)) => StatusCode::CONFLICT,
            ApiError::Rbac(RbacError::StoreUnavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ReloadFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        });

        (status, body).into_response()
    }
}
