// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),
    InvariantViolation(String),

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    Internal(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::InvariantViolation(_) => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg) => msg,
            ApiError::InvariantViolation(msg) => msg,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Internal(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        ApiError::InvariantViolation(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::DatabaseError> for ApiError {
    fn from(err: crate::database::DatabaseError) -> Self {
        match err {
            crate::database::DatabaseError::ConfigMissing(_) => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            crate::database::DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal("An error occurred while processing your request")
            }
            crate::database::DatabaseError::Migration(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
        }
    }
}

impl From<crate::services::user_service::UserError> for ApiError {
    fn from(err: crate::services::user_service::UserError) -> Self {
        use crate::services::user_service::UserError;
        match err {
            UserError::EmailTaken => {
                ApiError::conflict("User with this email already exists")
            }
            UserError::InvalidTeamCode => ApiError::validation("Invalid team code"),
            UserError::TeamCodeNotFound => ApiError::not_found("Team code not found"),
            UserError::UserNotFound => ApiError::not_found("User not found"),
            UserError::AdminCeiling(max) => ApiError::invariant_violation(format!(
                "Cannot assign more than {} admins",
                max
            )),
            UserError::LastAdmin => {
                ApiError::invariant_violation("Cannot demote the last admin user")
            }
            UserError::Database(e) => crate::database::DatabaseError::from(e).into(),
            UserError::Pool(e) => e.into(),
        }
    }
}

impl From<crate::services::team_service::TeamError> for ApiError {
    fn from(err: crate::services::team_service::TeamError) -> Self {
        use crate::services::team_service::TeamError;
        match err {
            TeamError::Duplicate => {
                ApiError::conflict("Team with the same name or code already exists")
            }
            TeamError::NotFound => ApiError::not_found("Team not found"),
            TeamError::Database(e) => crate::database::DatabaseError::from(e).into(),
            TeamError::Pool(e) => e.into(),
        }
    }
}

impl From<crate::services::project_service::ProjectError> for ApiError {
    fn from(err: crate::services::project_service::ProjectError) -> Self {
        use crate::services::project_service::ProjectError;
        match err {
            ProjectError::CreateDenied => {
                ApiError::forbidden("Only managers and admins can create projects")
            }
            ProjectError::ManagerWithoutTeam => {
                ApiError::forbidden("Manager must belong to a team to create projects")
            }
            ProjectError::TeamCodeRequired => {
                ApiError::validation("teamCode is required for admin project creation")
            }
            ProjectError::TeamNotFound => ApiError::not_found("Team not found"),
            ProjectError::Duplicate => {
                ApiError::conflict("Project with this name already exists in the team")
            }
            ProjectError::Database(e) => crate::database::DatabaseError::from(e).into(),
            ProjectError::Pool(e) => e.into(),
        }
    }
}

impl From<crate::services::task_service::TaskError> for ApiError {
    fn from(err: crate::services::task_service::TaskError) -> Self {
        use crate::services::task_service::TaskError;
        match err {
            TaskError::ProjectNotFound => ApiError::not_found("Project not found"),
            TaskError::OutsideTeamProject => ApiError::forbidden(
                "Managers can only create tasks in their own team projects",
            ),
            TaskError::AssigneeNotFound => ApiError::not_found("Assignee user not found"),
            TaskError::AssigneeOutsideTeam => {
                ApiError::forbidden("Assignee must belong to the project team")
            }
            TaskError::Database(e) => crate::database::DatabaseError::from(e).into(),
            TaskError::Pool(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
