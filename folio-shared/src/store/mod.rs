/// Persistence boundary for users, projects, tasks and documents
///
/// [`Store`] is the one trait the rest of the crate talks to. [`PgStore`] runs
/// against PostgreSQL through the queries in [`crate::models`];
/// `MemoryStore` (feature `memory-store`) keeps everything in process for tests.
///
/// Lookups by id are owner-agnostic on purpose: the ownership resolver needs
/// to tell "missing" from "foreign". Listing operations take the owner and
/// filter on it in the same query.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::document::{CreateDocument, Document};
use crate::models::project::{CreateProject, Project, ProjectTaskCounts, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

#[cfg(any(test, feature = "memory-store"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "memory-store"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated (duplicate username, storage path)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The parent row a create referred to does not exist (or was deleted
    /// while the create was in flight)
    #[error("parent record does not exist")]
    MissingParent,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store trait covering the whole resource tree
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks that the backing database answers
    async fn health_check(&self) -> Result<(), StoreError>;

    // Users

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    // Projects

    async fn create_project(&self, data: CreateProject) -> Result<Project, StoreError>;

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// Projects owned by `owner_id`, newest first
    async fn list_projects(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError>;

    async fn update_project(
        &self,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Project>, StoreError>;

    async fn project_task_counts(&self, id: Uuid) -> Result<ProjectTaskCounts, StoreError>;

    /// Removes a project with its tasks and documents in one atomic step
    ///
    /// Returns the storage paths of the removed documents, or None if the
    /// project didn't exist.
    async fn delete_project(&self, id: Uuid) -> Result<Option<Vec<String>>, StoreError>;

    // Tasks

    /// Fails with [`StoreError::MissingParent`] if the project is gone
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Tasks of `project_id` if that project is owned by `owner_id`, newest first
    async fn list_tasks(&self, project_id: Uuid, owner_id: Uuid) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    async fn task_document_count(&self, id: Uuid) -> Result<i64, StoreError>;

    /// Removes a task with its documents in one atomic step
    async fn delete_task(&self, id: Uuid) -> Result<Option<Vec<String>>, StoreError>;

    // Documents

    /// Fails with [`StoreError::MissingParent`] if the task is gone
    async fn create_document(&self, data: CreateDocument) -> Result<Document, StoreError>;

    async fn find_document(&self, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Documents of `task_id` if its project is owned by `owner_id`, newest first
    async fn list_documents(
        &self,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Document>, StoreError>;

    async fn rename_document(
        &self,
        id: Uuid,
        file_name: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Repoints a document at `new_path` only if it still points at `expected_path`
    async fn swap_document_path(
        &self,
        id: Uuid,
        expected_path: &str,
        new_path: &str,
        file_name: Option<&str>,
    ) -> Result<Option<Document>, StoreError>;

    /// Removes a document record, returning the path it pointed at
    async fn delete_document(&self, id: Uuid) -> Result<Option<String>, StoreError>;
}
