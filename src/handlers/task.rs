// handlers/task.rs - /task/* route handlers

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::policy;
use crate::auth::principal::Principal;
use crate::error::ApiError;
use crate::services::task_service::TaskService;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "projectId")]
    pub project_id: Option<Uuid>,
    #[serde(alias = "assigneeId")]
    pub assignee_id: Option<Uuid>,
}

/// POST /task/create - create a task in a project (manager and above; the
/// cross-team constraints are applied against the resolved project)
pub async fn create(
    principal: Principal,
    Json(body): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !policy::has_role(&principal, Role::Manager) {
        return Err(ApiError::forbidden("Only managers and admins can create tasks"));
    }

    let title = body.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(ApiError::validation("Task title is required"));
    }
    let Some(project_id) = body.project_id else {
        return Err(ApiError::validation("Project ID is required"));
    };

    let task = TaskService::new()
        .await?
        .create(
            &principal,
            title,
            body.description.as_deref(),
            project_id,
            body.assignee_id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "task": task } })),
    ))
}
