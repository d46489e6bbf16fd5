use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::verify_token;
use crate::database::models::user::User;
use crate::database::{Database, DatabaseError};
use crate::types::Role;

/// The calling identity for the duration of one request: the persisted user
/// with the password hash excluded. Also the wire shape for user responses.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            team_id: user.team_id,
            created_at: user.created_at,
        }
    }
}

/// Resolve the calling principal from a session token.
///
/// An absent, invalid, or expired token and a token for a user that no longer
/// exists all resolve to `None`; callers cannot distinguish which failure
/// occurred. Only infrastructure failures surface as errors.
pub async fn resolve_principal(token: Option<&str>) -> Result<Option<Principal>, DatabaseError> {
    let Some(token) = token else {
        return Ok(None);
    };

    let Ok(user_id) = verify_token(token) else {
        return Ok(None);
    };

    let pool = Database::pool().await?;
    let principal = sqlx::query_as::<_, Principal>(
        "SELECT id, name, email, role, team_id, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    Ok(principal)
}
