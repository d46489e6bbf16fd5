use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::policy::ProjectTeamResolution;
use crate::auth::principal::Principal;
use crate::database::models::project::Project;
use crate::database::{self, Database, DatabaseError};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Only managers and admins can create projects")]
    CreateDenied,

    #[error("Manager must belong to a team to create projects")]
    ManagerWithoutTeam,

    #[error("teamCode is required")]
    TeamCodeRequired,

    #[error("Team not found")]
    TeamNotFound,

    #[error("Project with this name already exists in the team")]
    Duplicate,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] DatabaseError),
}

pub struct ProjectService {
    pool: PgPool,
}

impl ProjectService {
    pub async fn new() -> Result<Self, ProjectError> {
        Ok(Self {
            pool: Database::pool().await?,
        })
    }

    /// Create a project in the team named by the resolution mode: a manager's
    /// own team, or the team matching the code an admin supplied. Project
    /// names are unique within their team only.
    pub async fn create(
        &self,
        principal: &Principal,
        resolution: ProjectTeamResolution,
        name: &str,
        description: Option<&str>,
        team_code: Option<&str>,
    ) -> Result<Project, ProjectError> {
        let team_id = match resolution {
            ProjectTeamResolution::FromOwnTeam => {
                principal.team_id.ok_or(ProjectError::ManagerWithoutTeam)?
            }
            ProjectTeamResolution::FromTeamCode => {
                let code = team_code
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or(ProjectError::TeamCodeRequired)?;
                self.team_id_for_code(code)
                    .await?
                    .ok_or(ProjectError::TeamNotFound)?
            }
            ProjectTeamResolution::Denied => return Err(ProjectError::CreateDenied),
        };

        let duplicate: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM projects WHERE name = $1 AND team_id = $2")
                .bind(name)
                .bind(team_id)
                .fetch_optional(&self.pool)
                .await?;
        if duplicate.is_some() {
            return Err(ProjectError::Duplicate);
        }

        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (id, name, description, team_id, created_by_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(team_id)
        .bind(principal.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if database::is_unique_violation(&e) {
                ProjectError::Duplicate
            } else {
                ProjectError::Database(e)
            }
        })?;

        Ok(project)
    }

    async fn team_id_for_code(&self, code: &str) -> Result<Option<Uuid>, ProjectError> {
        let code = crate::services::team_service::normalize_code(code);
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM teams WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }
}
