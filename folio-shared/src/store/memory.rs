/// In-process [`Store`] for tests
///
/// Everything sits behind one lock, so each operation (including the cascades)
/// is atomic with respect to every other. Foreign keys and unique constraints
/// are checked the same way PostgreSQL would report them.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::document::{CreateDocument, Document};
use crate::models::project::{CreateProject, Project, ProjectTaskCounts, UpdateProject};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    documents: Vec<Document>,
}

impl Tables {
    fn owner_of_project(&self, project_id: Uuid) -> Option<Uuid> {
        self.projects
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| p.owner_id)
    }

    fn owner_of_task(&self, task_id: Uuid) -> Option<Uuid> {
        let task = self.tasks.iter().find(|t| t.id == task_id)?;
        self.owner_of_project(task.project_id)
    }

    /// Removes documents of the given tasks, returning their storage paths
    fn drain_documents(&mut self, task_ids: &[Uuid]) -> Vec<String> {
        let mut paths = Vec::new();
        self.documents.retain(|d| {
            if task_ids.contains(&d.task_id) {
                paths.push(d.storage_path.clone());
                false
            } else {
                true
            }
        });
        paths
    }
}

/// Store keeping all rows in memory
///
/// Rows are kept in insertion order; listings walk them newest first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            first_name: data.first_name,
            last_name: data.last_name,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_project(&self, data: CreateProject) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == data.owner_id) {
            return Err(StoreError::MissingParent);
        }

        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            created_at: Utc::now(),
            owner_id: data.owner_id,
        };
        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .rev()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_project(
        &self,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Project>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = description;
        }
        Ok(Some(project.clone()))
    }

    async fn project_task_counts(&self, id: Uuid) -> Result<ProjectTaskCounts, StoreError> {
        let tables = self.tables.read().await;
        let tasks = tables.tasks.iter().filter(|t| t.project_id == id);
        let (total, completed) = tasks.fold((0, 0), |(total, done), t| {
            (total + 1, done + i64::from(t.is_completed))
        });
        Ok(ProjectTaskCounts {
            tasks_count: total,
            completed_tasks_count: completed,
        })
    }

    async fn delete_project(&self, id: Uuid) -> Result<Option<Vec<String>>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.iter().any(|p| p.id == id) {
            return Ok(None);
        }

        let task_ids: Vec<Uuid> = tables
            .tasks
            .iter()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        let paths = tables.drain_documents(&task_ids);
        tables.tasks.retain(|t| t.project_id != id);
        tables.projects.retain(|p| p.id != id);
        Ok(Some(paths))
    }

    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.owner_of_project(data.project_id).is_none() {
            return Err(StoreError::MissingParent);
        }

        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            created_at: Utc::now(),
            due_date: data.due_date,
            priority: data.priority,
            is_completed: data.is_completed,
            project_id: data.project_id,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, project_id: Uuid, owner_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        if tables.owner_of_project(project_id) != Some(owner_id) {
            return Ok(Vec::new());
        }
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(due_date) = data.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        if let Some(is_completed) = data.is_completed {
            task.is_completed = is_completed;
        }
        Ok(Some(task.clone()))
    }

    async fn task_document_count(&self, id: Uuid) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.documents.iter().filter(|d| d.task_id == id).count() as i64)
    }

    async fn delete_task(&self, id: Uuid) -> Result<Option<Vec<String>>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.tasks.iter().any(|t| t.id == id) {
            return Ok(None);
        }

        let paths = tables.drain_documents(&[id]);
        tables.tasks.retain(|t| t.id != id);
        Ok(Some(paths))
    }

    async fn create_document(&self, data: CreateDocument) -> Result<Document, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.owner_of_task(data.task_id).is_none() {
            return Err(StoreError::MissingParent);
        }
        if tables
            .documents
            .iter()
            .any(|d| d.storage_path == data.storage_path)
        {
            return Err(StoreError::Conflict(
                "documents_storage_path_key".to_string(),
            ));
        }

        let document = Document {
            id: Uuid::new_v4(),
            file_name: data.file_name,
            storage_path: data.storage_path,
            uploaded_at: Utc::now(),
            task_id: data.task_id,
        };
        tables.documents.push(document.clone());
        Ok(document)
    }

    async fn find_document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn list_documents(
        &self,
        task_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        let tables = self.tables.read().await;
        if tables.owner_of_task(task_id) != Some(owner_id) {
            return Ok(Vec::new());
        }
        Ok(tables
            .documents
            .iter()
            .rev()
            .filter(|d| d.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn rename_document(
        &self,
        id: Uuid,
        file_name: &str,
    ) -> Result<Option<Document>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(document) = tables.documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };

        document.file_name = file_name.to_string();
        Ok(Some(document.clone()))
    }

    async fn swap_document_path(
        &self,
        id: Uuid,
        expected_path: &str,
        new_path: &str,
        file_name: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .documents
            .iter()
            .any(|d| d.id != id && d.storage_path == new_path)
        {
            return Err(StoreError::Conflict(
                "documents_storage_path_key".to_string(),
            ));
        }

        let Some(document) = tables
            .documents
            .iter_mut()
            .find(|d| d.id == id && d.storage_path == expected_path)
        else {
            return Ok(None);
        };

        document.storage_path = new_path.to_string();
        if let Some(name) = file_name {
            document.file_name = name.to_string();
        }
        document.uploaded_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete_document(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.documents.iter().position(|d| d.id == id) else {
            return Ok(None);
        };

        Ok(Some(tables.documents.remove(index).storage_path))
    }
}
