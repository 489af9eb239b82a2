/// Task CRUD under a project

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::documents::DocumentView;
use super::{present, Scope, ServiceError, ServiceResult};
use crate::models::task::{CreateTask, Priority, Task, UpdateTask};

/// Payload for creating a task
///
/// There is no project field: the project always comes from the route.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewTask {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub is_completed: bool,
}

/// Partial update; absent fields are left alone, `"due_date": null` clears it
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TaskChanges {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub priority: Option<Priority>,

    pub is_completed: Option<bool>,
}

/// Task with its documents
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,

    pub documents: Vec<DocumentView>,
    pub documents_count: i64,
}

impl TaskView {
    /// `owner_id` is the owner of the task's project, already checked by the caller
    pub(crate) async fn build(scope: &Scope, task: Task, owner_id: Uuid) -> ServiceResult<Self> {
        let documents_count = scope.store.task_document_count(task.id).await?;
        let documents = scope
            .store
            .list_documents(task.id, owner_id)
            .await?
            .into_iter()
            .map(|d| DocumentView::new(d, task.project_id))
            .collect();

        Ok(Self {
            task,
            documents,
            documents_count,
        })
    }
}

#[derive(Clone)]
pub struct TaskService {
    scope: Scope,
}

impl TaskService {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Tasks of a project the requester owns, newest first
    pub async fn list(&self, requester: Uuid, project_id: Uuid) -> ServiceResult<Vec<TaskView>> {
        self.scope.project(requester, project_id).await?;

        let tasks = self.scope.store.list_tasks(project_id, requester).await?;
        let mut views = Vec::with_capacity(tasks.len());
        for task in tasks {
            views.push(TaskView::build(&self.scope, task, requester).await?);
        }
        Ok(views)
    }

    /// Creates a task under `project_id`
    pub async fn create(
        &self,
        requester: Uuid,
        project_id: Uuid,
        input: NewTask,
    ) -> ServiceResult<TaskView> {
        input.validate()?;
        self.scope.project(requester, project_id).await?;

        let task = self
            .scope
            .store
            .create_task(CreateTask {
                project_id,
                title: input.title,
                description: input.description,
                due_date: input.due_date,
                priority: input.priority,
                is_completed: input.is_completed,
            })
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::NotFound(_) => ServiceError::NotFound("project"),
                other => other,
            })?;

        info!(task_id = %task.id, project_id = %project_id, "Task created");
        TaskView::build(&self.scope, task, requester).await
    }

    pub async fn retrieve(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
    ) -> ServiceResult<TaskView> {
        let task = self.scope.task(requester, project_id, task_id).await?;
        TaskView::build(&self.scope, task, requester).await
    }

    pub async fn update(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> ServiceResult<TaskView> {
        changes.validate()?;
        self.scope.task(requester, project_id, task_id).await?;

        let task = self
            .scope
            .store
            .update_task(
                task_id,
                UpdateTask {
                    title: changes.title,
                    description: changes.description,
                    due_date: changes.due_date,
                    priority: changes.priority,
                    is_completed: changes.is_completed,
                },
            )
            .await?
            .ok_or(ServiceError::NotFound("task"))?;

        TaskView::build(&self.scope, task, requester).await
    }

    /// Deletes the task, its documents and their files
    pub async fn delete(&self, requester: Uuid, project_id: Uuid, task_id: Uuid) -> ServiceResult<()> {
        self.scope.task(requester, project_id, task_id).await?;

        let paths = self
            .scope
            .store
            .delete_task(task_id)
            .await?
            .ok_or(ServiceError::NotFound("task"))?;

        self.scope.lifecycle.on_cascade(&paths).await;
        info!(task_id = %task_id, documents = paths.len(), "Task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::projects::NewProject;
    use super::super::test_support::{harness, stored_files, Harness};
    use super::*;
    use crate::documents::Upload;

    async fn project(h: &Harness, owner: Uuid) -> Uuid {
        h.services
            .projects
            .create(
                owner,
                NewProject {
                    name: "p".into(),
                    description: String::new(),
                },
            )
            .await
            .unwrap()
            .project
            .id
    }

    fn titled(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            ..NewTask::default()
        }
    }

    #[tokio::test]
    async fn test_create_uses_route_project_and_defaults() {
        let h = harness().await;
        let pid = project(&h, h.alice).await;

        let view = h.services.tasks.create(h.alice, pid, titled("write")).await.unwrap();
        assert_eq!(view.task.project_id, pid);
        assert_eq!(view.task.priority, Priority::Medium);
        assert!(!view.task.is_completed);
        assert_eq!(view.documents_count, 0);
    }

    #[tokio::test]
    async fn test_create_under_foreign_project_forbidden_and_creates_nothing() {
        let h = harness().await;
        let pid = project(&h, h.alice).await;

        let result = h.services.tasks.create(h.bob, pid, titled("sneaky")).await;
        assert!(matches!(result, Err(ServiceError::Forbidden)));

        assert!(h.services.tasks.list(h.alice, pid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_under_missing_project_not_found() {
        let h = harness().await;
        let result = h.services.tasks.create(h.alice, Uuid::new_v4(), titled("t")).await;
        assert!(matches!(result, Err(ServiceError::NotFound("project"))));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_list_retrieve_update_delete() {
        let h = harness().await;
        let pid = project(&h, h.alice).await;
        let tid = h.services.tasks.create(h.alice, pid, titled("t")).await.unwrap().task.id;

        assert!(matches!(
            h.services.tasks.list(h.bob, pid).await,
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            h.services.tasks.retrieve(h.bob, pid, tid).await,
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            h.services.tasks.update(h.bob, pid, tid, TaskChanges::default()).await,
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            h.services.tasks.delete(h.bob, pid, tid).await,
            Err(ServiceError::Forbidden)
        ));
        assert!(h.services.tasks.retrieve(h.alice, pid, tid).await.is_ok());
    }

    #[tokio::test]
    async fn test_task_under_wrong_project_is_not_found() {
        let h = harness().await;
        let p1 = project(&h, h.alice).await;
        let p2 = project(&h, h.alice).await;
        let tid = h.services.tasks.create(h.alice, p1, titled("t")).await.unwrap().task.id;

        assert!(matches!(
            h.services.tasks.retrieve(h.alice, p2, tid).await,
            Err(ServiceError::NotFound("task"))
        ));

        // Bob's own project cannot be used to reach Alice's task
        let bobs = project(&h, h.bob).await;
        assert!(matches!(
            h.services.tasks.retrieve(h.bob, bobs, tid).await,
            Err(ServiceError::NotFound("task"))
        ));
    }

    #[tokio::test]
    async fn test_update_partial_and_clear_due_date() {
        let h = harness().await;
        let pid = project(&h, h.alice).await;
        let due = Utc::now();
        let tid = h
            .services
            .tasks
            .create(
                h.alice,
                pid,
                NewTask {
                    title: "t".into(),
                    due_date: Some(due),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap()
            .task
            .id;

        let changes: TaskChanges =
            serde_json::from_str(r#"{"is_completed": true, "priority": "High"}"#).unwrap();
        let view = h.services.tasks.update(h.alice, pid, tid, changes).await.unwrap();
        assert!(view.task.is_completed);
        assert_eq!(view.task.priority, Priority::High);
        assert_eq!(view.task.due_date, Some(due));

        let changes: TaskChanges = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        let view = h.services.tasks.update(h.alice, pid, tid, changes).await.unwrap();
        assert_eq!(view.task.due_date, None);
        assert_eq!(view.task.title, "t");
    }

    #[test]
    fn test_task_changes_absent_vs_null() {
        let absent: TaskChanges = serde_json::from_str("{}").unwrap();
        assert!(absent.due_date.is_none());

        let null: TaskChanges = serde_json::from_str(r#"{"due_date": null}"#).unwrap();
        assert_eq!(null.due_date, Some(None));
    }

    #[tokio::test]
    async fn test_delete_removes_document_files() {
        let h = harness().await;
        let pid = project(&h, h.alice).await;
        let keep = h.services.tasks.create(h.alice, pid, titled("keep")).await.unwrap().task.id;
        let gone = h.services.tasks.create(h.alice, pid, titled("drop")).await.unwrap().task.id;

        let kept = h
            .services
            .documents
            .create(h.alice, pid, keep, Upload::new("k.txt", "k"), None)
            .await
            .unwrap();
        h.services
            .documents
            .create(h.alice, pid, gone, Upload::new("d.txt", "d"), None)
            .await
            .unwrap();

        h.services.tasks.delete(h.alice, pid, gone).await.unwrap();

        let files = stored_files(&h);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with(&kept.document.storage_path));
    }

    #[tokio::test]
    async fn test_views_nest_task_documents() {
        let h = harness().await;
        let pid = project(&h, h.alice).await;
        let tid = h.services.tasks.create(h.alice, pid, titled("t")).await.unwrap().task.id;
        let doc = h
            .services
            .documents
            .create(h.alice, pid, tid, Upload::new("notes.txt", "n"), None)
            .await
            .unwrap();

        let view = h.services.tasks.retrieve(h.alice, pid, tid).await.unwrap();
        assert_eq!(view.documents_count, 1);
        assert_eq!(view.documents[0].document.id, doc.document.id);

        let listed = h.services.tasks.list(h.alice, pid).await.unwrap();
        assert_eq!(listed[0].documents.len(), 1);

        let project = h.services.projects.retrieve(h.alice, pid).await.unwrap();
        assert_eq!(project.tasks[0].documents[0].document.id, doc.document.id);
    }
}
