/// Document model and database operations
///
/// A document row is the record half of an uploaded file; the bytes live in a
/// [`crate::files::backend::FileStore`] at `storage_path`. Rows are only written
/// through [`crate::documents::DocumentLifecycle`], which keeps the two halves
/// in step.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE documents (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     file_name VARCHAR(255) NOT NULL,
///     storage_path VARCHAR(512) NOT NULL UNIQUE,
///     uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Document attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,

    /// Display name shown to users
    pub file_name: String,

    /// Relative path of the backing file in the file store
    pub storage_path: String,

    /// When the current file was uploaded
    pub uploaded_at: DateTime<Utc>,

    /// Parent task, fixed for the document's lifetime
    pub task_id: Uuid,
}

/// Input for creating a new document record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    /// Parent task (taken from the route)
    pub task_id: Uuid,

    /// Display name
    pub file_name: String,

    /// Generated storage path of the already-written file
    pub storage_path: String,
}

impl Document {
    /// Inserts a document record
    pub async fn create(pool: &PgPool, data: CreateDocument) -> Result<Self, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (task_id, file_name, storage_path)
            VALUES ($1, $2, $3)
            RETURNING id, file_name, storage_path, uploaded_at, task_id
            "#,
        )
        .bind(data.task_id)
        .bind(data.file_name)
        .bind(data.storage_path)
        .fetch_one(pool)
        .await?;

        Ok(document)
    }

    /// Finds a document by ID, regardless of owner
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, file_name, storage_path, uploaded_at, task_id
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(document)
    }

    /// Lists documents of a task, only if the task's project belongs to `owner_id`
    pub async fn list_for_owner(
        pool: &PgPool,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT d.id, d.file_name, d.storage_path, d.uploaded_at, d.task_id
            FROM documents d
            JOIN tasks t ON t.id = d.task_id
            JOIN projects p ON p.id = t.project_id
            WHERE d.task_id = $1 AND p.owner_id = $2
            ORDER BY d.uploaded_at DESC
            "#,
        )
        .bind(task_id)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(documents)
    }

    /// Changes the display name only
    pub async fn rename(
        pool: &PgPool,
        id: Uuid,
        file_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET file_name = $2
            WHERE id = $1
            RETURNING id, file_name, storage_path, uploaded_at, task_id
            "#,
        )
        .bind(id)
        .bind(file_name)
        .fetch_optional(pool)
        .await?;

        Ok(document)
    }

    /// Points a document at a new file, if it still points at `expected_path`
    ///
    /// This is the compare-and-swap step of a file replacement. It matches
    /// nothing if the document was deleted or its path changed since the
    /// caller read it.
    ///
    /// # Returns
    ///
    /// The updated document, or None if the guard didn't match
    pub async fn swap_storage_path(
        pool: &PgPool,
        id: Uuid,
        expected_path: &str,
        new_path: &str,
        file_name: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET storage_path = $3,
                file_name = COALESCE($4, file_name),
                uploaded_at = NOW()
            WHERE id = $1 AND storage_path = $2
            RETURNING id, file_name, storage_path, uploaded_at, task_id
            "#,
        )
        .bind(id)
        .bind(expected_path)
        .bind(new_path)
        .bind(file_name)
        .fetch_optional(pool)
        .await?;

        Ok(document)
    }

    /// Deletes a document record
    ///
    /// # Returns
    ///
    /// The storage path the record pointed at when it was removed, or None if
    /// it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let path: Option<String> =
            sqlx::query_scalar("DELETE FROM documents WHERE id = $1 RETURNING storage_path")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serializes_snake_case() {
        let document = Document {
            id: Uuid::new_v4(),
            file_name: "report.pdf".to_string(),
            storage_path: "documents/2025/01/03/20250103142501_00000000_report.pdf".to_string(),
            uploaded_at: Utc::now(),
            task_id: Uuid::new_v4(),
        };

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["file_name"], "report.pdf");
        assert!(json["storage_path"].as_str().unwrap().starts_with("documents/"));
    }
}
