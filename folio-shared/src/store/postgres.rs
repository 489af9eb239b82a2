/// PostgreSQL-backed [`Store`]

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::db::pool;
use crate::models::document::{CreateDocument, Document};
use crate::models::project::{CreateProject, Project, ProjectTaskCounts, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// Store running every query against a shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translates constraint violations into their store-level meaning
fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique constraint").to_string();
            return StoreError::Conflict(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingParent;
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        pool::health_check(&self.pool).await.map_err(map_err)
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        User::create(&self.pool, data).await.map_err(map_err)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        User::find_by_id(&self.pool, id).await.map_err(map_err)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        User::find_by_username(&self.pool, username)
            .await
            .map_err(map_err)
    }

    async fn create_project(&self, data: CreateProject) -> Result<Project, StoreError> {
        Project::create(&self.pool, data).await.map_err(map_err)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Project::find_by_id(&self.pool, id).await.map_err(map_err)
    }

    async fn list_projects(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError> {
        Project::list_by_owner(&self.pool, owner_id)
            .await
            .map_err(map_err)
    }

    async fn update_project(
        &self,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Project>, StoreError> {
        Project::update(&self.pool, id, data).await.map_err(map_err)
    }

    async fn project_task_counts(&self, id: Uuid) -> Result<ProjectTaskCounts, StoreError> {
        Project::task_counts(&self.pool, id).await.map_err(map_err)
    }

    async fn delete_project(&self, id: Uuid) -> Result<Option<Vec<String>>, StoreError> {
        Project::delete_cascade(&self.pool, id)
            .await
            .map_err(map_err)
    }

    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        Task::create(&self.pool, data).await.map_err(map_err)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Task::find_by_id(&self.pool, id).await.map_err(map_err)
    }

    async fn list_tasks(&self, project_id: Uuid, owner_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Task::list_for_owner(&self.pool, project_id, owner_id)
            .await
            .map_err(map_err)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        Task::update(&self.pool, id, data).await.map_err(map_err)
    }

    async fn task_document_count(&self, id: Uuid) -> Result<i64, StoreError> {
        Task::document_count(&self.pool, id).await.map_err(map_err)
    }

    async fn delete_task(&self, id: Uuid) -> Result<Option<Vec<String>>, StoreError> {
        Task::delete_cascade(&self.pool, id).await.map_err(map_err)
    }

    async fn create_document(&self, data: CreateDocument) -> Result<Document, StoreError> {
        Document::create(&self.pool, data).await.map_err(map_err)
    }

    async fn find_document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        Document::find_by_id(&self.pool, id).await.map_err(map_err)
    }

    async fn list_documents(
        &self,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        Document::list_for_owner(&self.pool, task_id, owner_id)
            .await
            .map_err(map_err)
    }

    async fn rename_document(
        &self,
        id: Uuid,
        file_name: &str,
    ) -> Result<Option<Document>, StoreError> {
        Document::rename(&self.pool, id, file_name)
            .await
            .map_err(map_err)
    }

    async fn swap_document_path(
        &self,
        id: Uuid,
        expected_path: &str,
        new_path: &str,
        file_name: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        Document::swap_storage_path(&self.pool, id, expected_path, new_path, file_name)
            .await
            .map_err(map_err)
    }

    async fn delete_document(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        Document::delete(&self.pool, id).await.map_err(map_err)
    }
}
