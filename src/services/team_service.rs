use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::team::{Team, TeamMember, TeamWithMemberCount};
use crate::database::{self, Database, DatabaseError};

#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    #[error("Team with the same name or code already exists")]
    Duplicate,

    #[error("Team not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] DatabaseError),
}

/// Team codes are stored upper-cased so collisions are case-insensitive
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub struct TeamService {
    pool: PgPool,
}

impl TeamService {
    pub async fn new() -> Result<Self, TeamError> {
        Ok(Self {
            pool: Database::pool().await?,
        })
    }

    /// Create a team. Name and code must be globally unique; the unique
    /// indexes are the final arbiter under concurrent creation.
    pub async fn create(
        &self,
        name: &str,
        code: &str,
        description: Option<&str>,
    ) -> Result<Team, TeamError> {
        let duplicate: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM teams WHERE name = $1 OR code = $2")
                .bind(name)
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        if duplicate.is_some() {
            return Err(TeamError::Duplicate);
        }

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (id, name, code, description) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(code)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if database::is_unique_violation(&e) {
                TeamError::Duplicate
            } else {
                TeamError::Database(e)
            }
        })?;

        Ok(team)
    }

    /// Partially update a team. Absent fields keep their current value.
    pub async fn update(
        &self,
        team_id: Uuid,
        name: Option<&str>,
        code: Option<&str>,
        description: Option<&str>,
    ) -> Result<Team, TeamError> {
        let existing = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TeamError::NotFound)?;

        let new_name = name.unwrap_or(&existing.name);
        let new_code = code.unwrap_or(&existing.code);

        let duplicate: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM teams WHERE id <> $1 AND (name = $2 OR code = $3)",
        )
        .bind(team_id)
        .bind(new_name)
        .bind(new_code)
        .fetch_optional(&self.pool)
        .await?;
        if duplicate.is_some() {
            return Err(TeamError::Duplicate);
        }

        let team = sqlx::query_as::<_, Team>(
            "UPDATE teams SET name = $2, code = $3, description = $4, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(team_id)
        .bind(new_name)
        .bind(new_code)
        .bind(description.or(existing.description.as_deref()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if database::is_unique_violation(&e) {
                TeamError::Duplicate
            } else {
                TeamError::Database(e)
            }
        })?;

        Ok(team)
    }

    /// Delete a team, returning the members it frees. Members keep their user
    /// records; the FK referential action clears their team_id.
    pub async fn delete(&self, team_id: Uuid) -> Result<Vec<TeamMember>, TeamError> {
        let mut tx = self.pool.begin().await?;

        let members = sqlx::query_as::<_, TeamMember>(
            "SELECT id, name, email, role FROM users WHERE team_id = $1 \
             ORDER BY created_at ASC, name ASC",
        )
        .bind(team_id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(TeamError::NotFound);
        }

        tx.commit().await?;
        Ok(members)
    }

    /// List all teams with member counts, optionally filtered by a
    /// case-insensitive search over name, code, and description.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<TeamWithMemberCount>, TeamError> {
        let base = "SELECT t.id, t.name, t.description, t.code, count(u.id) AS member_count, \
                    t.created_at, t.updated_at \
                    FROM teams t LEFT JOIN users u ON u.team_id = t.id";
        let tail = " GROUP BY t.id ORDER BY t.created_at DESC";

        let teams = match search {
            Some(term) if !term.is_empty() => {
                let pattern = format!("%{}%", term);
                let sql = format!(
                    "{} WHERE t.name ILIKE $1 OR t.code ILIKE $1 OR t.description ILIKE $1{}",
                    base, tail
                );
                sqlx::query_as::<_, TeamWithMemberCount>(&sql)
                    .bind(pattern)
                    .fetch_all(&self.pool)
                    .await?
            }
            _ => {
                let sql = format!("{}{}", base, tail);
                sqlx::query_as::<_, TeamWithMemberCount>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(teams)
    }

    /// Fetch a team together with its members
    pub async fn members(&self, team_id: Uuid) -> Result<(Team, Vec<TeamMember>), TeamError> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TeamError::NotFound)?;

        let members = sqlx::query_as::<_, TeamMember>(
            "SELECT id, name, email, role FROM users WHERE team_id = $1 \
             ORDER BY created_at ASC, name ASC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((team, members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_normalization_collides_case_variants() {
        assert_eq!(normalize_code("eng"), "ENG");
        assert_eq!(normalize_code(" Eng "), "ENG");
        assert_eq!(normalize_code("eng"), normalize_code("ENG"));
    }
}
