// handlers/project.rs - /project/* route handlers

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::policy::{self, ProjectTeamResolution};
use crate::auth::principal::Principal;
use crate::error::ApiError;
use crate::services::project_service::ProjectService;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "teamCode")]
    pub team_code: Option<String>,
}

/// POST /project/create - create a project. A manager's project lands in
/// their own team; an admin names the team by code.
pub async fn create(
    principal: Principal,
    Json(body): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resolution = policy::can_create_project(&principal);
    if resolution == ProjectTeamResolution::Denied {
        return Err(ApiError::forbidden("Only managers and admins can create projects"));
    }

    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::validation("Project name is required"));
    }

    let project = ProjectService::new()
        .await?
        .create(
            &principal,
            resolution,
            name,
            body.description.as_deref(),
            body.team_code.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "project": project } })),
    ))
}
