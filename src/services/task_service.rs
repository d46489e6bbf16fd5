use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::policy;
use crate::auth::principal::Principal;
use crate::database::models::project::Project;
use crate::database::models::task::Task;
use crate::database::models::user::User;
use crate::database::{Database, DatabaseError};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Project not found")]
    ProjectNotFound,

    #[error("Managers can only create tasks in their own team projects")]
    OutsideTeamProject,

    #[error("Assignee user not found")]
    AssigneeNotFound,

    #[error("Assignee must belong to the project team")]
    AssigneeOutsideTeam,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] DatabaseError),
}

pub struct TaskService {
    pool: PgPool,
}

impl TaskService {
    pub async fn new() -> Result<Self, TaskError> {
        Ok(Self {
            pool: Database::pool().await?,
        })
    }

    /// Create a task in a project. The caller's role floor is already
    /// checked; this resolves the project and assignee and applies the
    /// cross-team guards before persisting.
    pub async fn create(
        &self,
        principal: &Principal,
        title: &str,
        description: Option<&str>,
        project_id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> Result<Task, TaskError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TaskError::ProjectNotFound)?;

        if !policy::can_create_task(principal, project.team_id) {
            return Err(TaskError::OutsideTeamProject);
        }

        let assignee = match assignee_id {
            Some(id) => {
                let assignee = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or(TaskError::AssigneeNotFound)?;

                // Manager self-assignment check intentionally disabled,
                // pending product confirmation:
                // if assignee.id == principal.id && principal.role == Role::Manager {
                //     return Err(TaskError::SelfAssignment);
                // }

                if !policy::can_assign_task_to(assignee.role, assignee.team_id, project.team_id) {
                    return Err(TaskError::AssigneeOutsideTeam);
                }
                Some(assignee.id)
            }
            None => None,
        };

        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (id, title, description, project_id, assignee_id, created_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(project.id)
        .bind(assignee)
        .bind(principal.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }
}
