// handlers/user.rs - /user/* route handlers

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth;
use crate::auth::policy::{self, RoleAssignDecision, ScopeDenied};
use crate::auth::principal::Principal;
use crate::error::ApiError;
use crate::services::user_service::UserService;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "teamCode")]
    pub team_code: Option<String>,
}

/// POST /user/register - create an account and open a session
pub async fn register(
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Name, email and password are required"));
    }

    let password_hash = auth::hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal("An error occurred while processing your request")
    })?;

    // An empty team code means "no team", same as omitting it
    let team_code = body
        .team_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());

    let service = UserService::new().await?;
    let user = service
        .register(name, email, &password_hash, team_code)
        .await?;

    let token = auth::generate_token(user.id).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal("An error occurred while processing your request")
    })?;
    let jar = jar.add(auth::session_cookie(token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "success": true,
            "data": {
                "user": Principal::from(user),
                // Token echoed in the body for client convenience
                "token": token
            }
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /user/login - verify credentials and open a session.
/// Unknown email and wrong password answer identically.
pub async fn login(
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let service = UserService::new().await?;
    let Some(user) = service.find_by_email(email).await? else {
        return Err(ApiError::unauthenticated("Invalid email or password"));
    };

    let valid = auth::verify_password(password, &user.password).map_err(|e| {
        tracing::error!("Password verification failed: {}", e);
        ApiError::internal("An error occurred while processing your request")
    })?;
    if !valid {
        return Err(ApiError::unauthenticated("Invalid email or password"));
    }

    let token = auth::generate_token(user.id).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal("An error occurred while processing your request")
    })?;
    let jar = jar.add(auth::session_cookie(token.clone()));

    Ok((
        StatusCode::OK,
        jar,
        Json(json!({
            "success": true,
            "data": {
                "user": Principal::from(user),
                "token": token
            }
        })),
    ))
}

/// POST /user/logout - clear the session cookie. Succeeds whether or not a
/// session was open.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(auth::expired_session_cookie());
    (jar, Json(json!({ "success": true, "data": {} })))
}

/// GET /user/me - the calling principal
pub async fn me(principal: Principal) -> Json<Value> {
    Json(json!({ "success": true, "data": { "user": principal } }))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(alias = "teamId")]
    pub team_id: Option<Uuid>,
    pub role: Option<String>,
}

/// GET /user/ - list users visible under the caller's scope
pub async fn list(
    principal: Principal,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Value>, ApiError> {
    let scope = policy::scope_user_list(&principal).map_err(|denied| match denied {
        ScopeDenied::ManagerWithoutTeam => ApiError::forbidden("Manager has no team"),
        ScopeDenied::UserWithoutTeam => ApiError::forbidden("User has no team"),
    })?;

    let role_filter = match query.role.as_deref() {
        Some(value) => {
            Some(Role::parse(value).ok_or_else(|| ApiError::validation("Invalid role value"))?)
        }
        None => None,
    };

    let users = UserService::new()
        .await?
        .list(scope, query.team_id, role_filter)
        .await?;

    Ok(Json(json!({ "success": true, "data": { "users": users } })))
}

#[derive(Debug, Deserialize)]
pub struct AssignTeamRequest {
    #[serde(alias = "teamCode")]
    pub team_code: Option<String>,
}

/// PATCH /user/:id/team - move a user into a team by code (admin only)
pub async fn assign_team(
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AssignTeamRequest>,
) -> Result<Json<Value>, ApiError> {
    if !policy::can_manage_team(&principal) {
        return Err(ApiError::forbidden("Only admins can assign teams"));
    }

    let code = body.team_code.as_deref().map(str::trim).unwrap_or_default();
    if code.is_empty() {
        return Err(ApiError::validation("teamCode is required"));
    }

    let user = UserService::new().await?.assign_team(user_id, code).await?;
    Ok(Json(
        json!({ "success": true, "data": { "user": Principal::from(user) } }),
    ))
}

/// DELETE /user/:id/team - remove a user from their team (admin only)
pub async fn remove_from_team(
    principal: Principal,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !policy::can_manage_team(&principal) {
        return Err(ApiError::forbidden("Only admins can remove users from teams"));
    }

    let user = UserService::new().await?.remove_from_team(user_id).await?;
    Ok(Json(
        json!({ "success": true, "data": { "user": Principal::from(user) } }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: Option<String>,
}

/// PATCH /user/:id/role - reassign a user's role under the admin-count
/// invariants (admin only, never on yourself)
pub async fn assign_role(
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AssignRoleRequest>,
) -> Result<Json<Value>, ApiError> {
    match policy::can_assign_role(&principal, user_id) {
        RoleAssignDecision::NotAdmin => {
            return Err(ApiError::forbidden("Only admins can assign roles"));
        }
        RoleAssignDecision::SelfChange => {
            return Err(ApiError::invariant_violation("You cannot change your own role"));
        }
        RoleAssignDecision::Allowed => {}
    }

    let role_value = body.role.as_deref().map(str::trim).unwrap_or_default();
    if role_value.is_empty() {
        return Err(ApiError::validation("Role is required"));
    }
    let role = Role::parse(role_value).ok_or_else(|| ApiError::validation("Invalid role value"))?;

    let user = UserService::new().await?.assign_role(user_id, role).await?;
    Ok(Json(
        json!({ "success": true, "data": { "user": Principal::from(user) } }),
    ))
}
