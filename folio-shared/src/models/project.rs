/// Project model and database operations
///
/// Projects are the top of the resource tree below a user. The owner is set
/// once at creation and there is no query that reassigns it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use folio_shared::models::project::{Project, CreateProject};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, CreateProject {
///     name: "Thesis".to_string(),
///     description: "Final year project".to_string(),
///     owner_id,
/// }).await?;
///
/// let mine = Project::list_by_owner(&pool, owner_id).await?;
/// assert!(mine.iter().any(|p| p.id == project.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name (at most 200 characters)
    pub name: String,

    /// Free-form description (may be empty)
    pub description: String,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// Owning user, immutable after creation
    pub owner_id: Uuid,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Project name
    pub name: String,

    /// Description
    pub description: String,

    /// Owning user (always the authenticated requester)
    pub owner_id: Uuid,
}

/// Input for updating a project
///
/// Only non-None fields are updated. There is deliberately no owner field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,
}

/// Task counters shown alongside a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTaskCounts {
    /// Total tasks in the project
    pub tasks_count: i64,

    /// Tasks marked completed
    pub completed_tasks_count: i64,
}

impl Project {
    /// Creates a new project
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at, owner_id
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID, regardless of owner
    ///
    /// Callers must run the result through the access gate before exposing it.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, created_at, owner_id
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists projects owned by a user, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, created_at, owner_id
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates name and/or description
    ///
    /// # Returns
    ///
    /// The updated project, or None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            assignments.push(format!("name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }

        if assignments.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE projects SET {} WHERE id = $1 RETURNING id, name, description, created_at, owner_id",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Counts total and completed tasks in a project
    pub async fn task_counts(pool: &PgPool, id: Uuid) -> Result<ProjectTaskCounts, sqlx::Error> {
        let (tasks_count, completed_tasks_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_completed)
            FROM tasks
            WHERE project_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(ProjectTaskCounts {
            tasks_count,
            completed_tasks_count,
        })
    }

    /// Deletes a project with all its tasks and documents
    ///
    /// Runs in one transaction: the project row and its task rows are locked
    /// `FOR UPDATE` first, so no task or document can be attached while the
    /// cascade is in flight. Document rows are deleted explicitly so their
    /// storage paths come back to the caller for file cleanup.
    ///
    /// # Returns
    ///
    /// `Some(paths)` with the storage path of every removed document, or None
    /// if the project doesn't exist
    pub async fn delete_cascade(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("SELECT id FROM tasks WHERE project_id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let paths: Vec<String> = sqlx::query_scalar(
            r#"
            DELETE FROM documents
            WHERE task_id IN (SELECT id FROM tasks WHERE project_id = $1)
            RETURNING storage_path
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_project_default() {
        let update = UpdateProject::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
    }

    #[test]
    fn test_task_counts_serialize() {
        let counts = ProjectTaskCounts {
            tasks_count: 3,
            completed_tasks_count: 1,
        };
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["tasks_count"], 3);
        assert_eq!(json["completed_tasks_count"], 1);
    }
}
