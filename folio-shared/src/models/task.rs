/// Task model and database operations
///
/// A task belongs to exactly one project for its whole lifetime; no query
/// here changes `project_id`. Ownership is never stored on the task row, it is
/// always resolved through the parent project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     due_date TIMESTAMPTZ,
///     priority task_priority NOT NULL DEFAULT 'Medium',
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum Priority {
    /// Can wait
    Low,

    /// Default priority
    #[default]
    Medium,

    /// Needs attention first
    High,
}

impl Priority {
    /// Converts priority to its stored/display form
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

/// Task inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title (at most 200 characters)
    pub title: String,

    /// Free-form description (may be empty)
    pub description: String,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Priority (default Medium)
    pub priority: Priority,

    /// Whether the task is done
    pub is_completed: bool,

    /// Parent project, fixed for the task's lifetime
    pub project_id: Uuid,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Parent project (taken from the route, never the request body)
    pub project_id: Uuid,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// Priority
    pub priority: Priority,

    /// Completion flag
    pub is_completed: bool,
}

/// Input for updating a task
///
/// Only non-None fields are updated. `due_date: Some(None)` clears the deadline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New deadline (use Some(None) to clear)
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// New priority
    pub priority: Option<Priority>,

    /// New completion flag
    pub is_completed: Option<bool>,
}

const TASK_COLUMNS: &str =
    "id, title, description, created_at, due_date, priority, is_completed, project_id";

impl Task {
    /// Creates a new task under a project
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the project doesn't exist (or is
    /// being deleted concurrently).
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (project_id, title, description, due_date, priority, is_completed)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.due_date)
            .bind(data.priority)
            .bind(data.is_completed)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID, regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists tasks of a project, only if the project belongs to `owner_id`
    ///
    /// The owner filter is part of the query, so a foreign project id yields an
    /// empty list rather than someone else's tasks.
    pub async fn list_for_owner(
        pool: &PgPool,
        project_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.created_at, t.due_date,
                   t.priority, t.is_completed, t.project_id
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.project_id = $1 AND p.owner_id = $2
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(project_id)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task
    ///
    /// # Returns
    ///
    /// The updated task, or None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push(format!("description = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            assignments.push(format!("due_date = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            assignments.push(format!("priority = ${}", bind_count));
        }
        if data.is_completed.is_some() {
            bind_count += 1;
            assignments.push(format!("is_completed = ${}", bind_count));
        }

        if assignments.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 RETURNING {}",
            assignments.join(", "),
            TASK_COLUMNS
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);
        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(is_completed) = data.is_completed {
            q = q.bind(is_completed);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Counts documents attached to a task
    pub async fn document_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE task_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Deletes a task with all its documents
    ///
    /// Locks the task row, deletes its documents returning their storage paths,
    /// then deletes the task, all in one transaction.
    ///
    /// # Returns
    ///
    /// `Some(paths)` for the removed documents, or None if the task doesn't exist
    pub async fn delete_cascade(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let paths: Vec<String> =
            sqlx::query_scalar("DELETE FROM documents WHERE task_id = $1 RETURNING storage_path")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
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
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(Priority::Low.as_str(), "Low");
        assert_eq!(Priority::Medium.as_str(), "Medium");
        assert_eq!(Priority::High.as_str(), "High");
    }

    #[test]
    fn test_priority_serde_names() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        let parsed: Priority = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }

    #[test]
    fn test_update_task_default() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.due_date.is_none());
        assert!(update.priority.is_none());
        assert!(update.is_completed.is_none());
    }
}
