// handlers/team.rs - /team/* route handlers

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::policy;
use crate::auth::principal::Principal;
use crate::error::ApiError;
use crate::services::team_service::{normalize_code, TeamService};

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

/// POST /team/create - create a team (admin only). The code is stored
/// upper-cased so collisions are case-insensitive.
pub async fn create(
    principal: Principal,
    Json(body): Json<CreateTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !policy::can_create_team(&principal) {
        return Err(ApiError::forbidden("Only admins can create teams"));
    }

    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let code = body.code.as_deref().map(normalize_code).unwrap_or_default();
    if name.is_empty() || code.is_empty() {
        return Err(ApiError::validation("Name and code are required"));
    }

    let team = TeamService::new()
        .await?
        .create(name, &code, body.description.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "team": team } })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

/// PATCH /team/:id - partially update a team (admin only)
pub async fn update(
    principal: Principal,
    Path(team_id): Path<Uuid>,
    Json(body): Json<UpdateTeamRequest>,
) -> Result<Json<Value>, ApiError> {
    if !policy::can_manage_team(&principal) {
        return Err(ApiError::forbidden("Only admins can update teams"));
    }

    if body.name.is_none() && body.code.is_none() && body.description.is_none() {
        return Err(ApiError::validation(
            "At least one field (name, description, code) must be provided for update",
        ));
    }

    let name = body.name.as_deref().map(str::trim);
    if name == Some("") {
        return Err(ApiError::validation("Name cannot be empty"));
    }
    let code = body.code.as_deref().map(normalize_code);
    if code.as_deref() == Some("") {
        return Err(ApiError::validation("Code cannot be empty"));
    }

    let team = TeamService::new()
        .await?
        .update(team_id, name, code.as_deref(), body.description.as_deref())
        .await?;

    Ok(Json(json!({ "success": true, "data": { "team": team } })))
}

/// DELETE /team/:id - delete a team (admin only). Members keep their user
/// records and are returned as the freed member list.
pub async fn delete(
    principal: Principal,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !policy::can_manage_team(&principal) {
        return Err(ApiError::forbidden("Only admins can delete teams"));
    }

    let members = TeamService::new().await?.delete(team_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "team_id": team_id,
            "members": members
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct TeamListQuery {
    pub search: Option<String>,
}

/// GET /team/ - list teams with member counts (admin only)
pub async fn list(
    principal: Principal,
    Query(query): Query<TeamListQuery>,
) -> Result<Json<Value>, ApiError> {
    if !policy::can_manage_team(&principal) {
        return Err(ApiError::forbidden("Only admins can list teams"));
    }

    let search = query.search.as_deref().map(str::trim);
    let teams = TeamService::new().await?.list(search).await?;

    Ok(Json(json!({ "success": true, "data": { "teams": teams } })))
}

/// GET /team/:id/members - a team and its members, visible to admins and to
/// the team's own members
pub async fn members(
    principal: Principal,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !policy::can_view_team_members(&principal, team_id) {
        return Err(ApiError::forbidden(
            "You can only access your own team members",
        ));
    }

    let (team, members) = TeamService::new().await?.members(team_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "team": team,
            "members": members
        }
    })))
}
