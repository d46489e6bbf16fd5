use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::guards::{self, RoleChangeViolation};
use crate::auth::policy::UserListScope;
use crate::config;
use crate::database::models::user::{User, UserListEntry};
use crate::database::{self, Database, DatabaseError};
use crate::types::Role;

/// Advisory lock key serializing every mutation that reads and then changes
/// the admin population (registration promotion, role reassignment).
const ADMIN_POPULATION_LOCK: i64 = 0x5441_534b;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User with this email already exists")]
    EmailTaken,

    #[error("Invalid team code")]
    InvalidTeamCode,

    #[error("Team code not found")]
    TeamCodeNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Cannot assign more than {0} admins")]
    AdminCeiling(i64),

    #[error("Cannot demote the last admin user")]
    LastAdmin,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] DatabaseError),
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, UserError> {
        Ok(Self {
            pool: Database::pool().await?,
        })
    }

    /// Register a new user. The first user in an empty system is promoted to
    /// ADMIN; a supplied team code links the user into that team. The count
    /// and the insert share one transaction under the admin-population lock.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        team_code: Option<&str>,
    ) -> Result<User, UserError> {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(UserError::EmailTaken);
        }

        let team_id = match team_code {
            Some(code) => Some(
                self.team_id_for_code(code)
                    .await?
                    .ok_or(UserError::InvalidTeamCode)?,
            ),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADMIN_POPULATION_LOCK)
            .execute(&mut *tx)
            .await?;

        let user_count: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        let role = guards::registration_role(user_count);

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password, role, team_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(team_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if database::is_unique_violation(&e) {
                UserError::EmailTaken
            } else {
                UserError::Database(e)
            }
        })?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// List users under the caller's scope. Query filters are ANDed on top of
    /// the scope so a filter can narrow visibility but never widen it.
    pub async fn list(
        &self,
        scope: UserListScope,
        team_filter: Option<Uuid>,
        role_filter: Option<Role>,
    ) -> Result<Vec<UserListEntry>, UserError> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "SELECT u.id, u.name, u.email, u.role, u.team_id, t.name AS team_name, u.created_at \
             FROM users u LEFT JOIN teams t ON t.id = u.team_id WHERE ",
        );

        match scope {
            UserListScope::All => {
                qb.push("TRUE");
            }
            UserListScope::TeamOrUsers { team_id } => {
                qb.push("(u.team_id = ");
                qb.push_bind(team_id);
                qb.push(" OR u.role = 'USER')");
            }
            UserListScope::TeamExcludingAdmins { team_id } => {
                qb.push("u.team_id = ");
                qb.push_bind(team_id);
                qb.push(" AND u.role <> 'ADMIN'");
            }
        }

        if let Some(team_id) = team_filter {
            qb.push(" AND u.team_id = ");
            qb.push_bind(team_id);
        }
        if let Some(role) = role_filter {
            qb.push(" AND u.role = ");
            qb.push_bind(role);
        }

        qb.push(" ORDER BY u.created_at DESC");

        let users = qb
            .build_query_as::<UserListEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Move a user into the team named by the code
    pub async fn assign_team(&self, user_id: Uuid, team_code: &str) -> Result<User, UserError> {
        let team_id = self
            .team_id_for_code(team_code)
            .await?
            .ok_or(UserError::TeamCodeNotFound)?;

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET team_id = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserError::UserNotFound)?;

        Ok(user)
    }

    /// Clear a user's team membership
    pub async fn remove_from_team(&self, user_id: Uuid) -> Result<User, UserError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET team_id = NULL, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserError::UserNotFound)?;

        Ok(user)
    }

    /// Reassign a user's role. Counting the admins, checking the ceiling and
    /// floor, and applying the update happen in one transaction serialized by
    /// the admin-population lock so concurrent promotions cannot both pass.
    pub async fn assign_role(&self, user_id: Uuid, new_role: Role) -> Result<User, UserError> {
        let max_admins = config::config().security.max_admins;

        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ADMIN_POPULATION_LOCK)
            .execute(&mut *tx)
            .await?;

        let admin_count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM users WHERE role = 'ADMIN'")
                .fetch_one(&mut *tx)
                .await?;

        let target = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(UserError::UserNotFound)?;

        guards::check_role_change(target.role, new_role, admin_count, max_admins).map_err(
            |violation| match violation {
                RoleChangeViolation::AdminCeilingExceeded => UserError::AdminCeiling(max_admins),
                RoleChangeViolation::LastAdminProtected => UserError::LastAdmin,
            },
        )?;

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(new_role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Look up a team id by code. Codes are stored upper-cased, so the input
    /// is normalized the same way before the lookup.
    async fn team_id_for_code(&self, code: &str) -> Result<Option<Uuid>, UserError> {
        let code = crate::services::team_service::normalize_code(code);
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM teams WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }
}
