/// Project CRUD, scoped to the requester

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::tasks::TaskView;
use super::{Scope, ServiceError, ServiceResult};
use crate::models::project::{CreateProject, Project, UpdateProject};

/// Payload for creating a project
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProject {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

/// Partial update; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectChanges {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

/// Project as returned to its owner
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,

    /// Owner's username
    pub owner: String,

    pub tasks: Vec<TaskView>,
    pub tasks_count: i64,
    pub completed_tasks_count: i64,
}

#[derive(Clone)]
pub struct ProjectService {
    scope: Scope,
}

impl ProjectService {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Projects owned by the requester, newest first
    pub async fn list(&self, requester: Uuid) -> ServiceResult<Vec<ProjectView>> {
        self.scope.gate.authorize_collection(requester, None).await?;

        let projects = self.scope.store.list_projects(requester).await?;
        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            views.push(self.view(project).await?);
        }
        Ok(views)
    }

    /// Creates a project owned by the requester
    pub async fn create(&self, requester: Uuid, input: NewProject) -> ServiceResult<ProjectView> {
        input.validate()?;
        self.scope.gate.authorize_collection(requester, None).await?;

        let project = self
            .scope
            .store
            .create_project(CreateProject {
                name: input.name,
                description: input.description,
                owner_id: requester,
            })
            .await?;

        info!(project_id = %project.id, owner_id = %requester, "Project created");
        self.view(project).await
    }

    pub async fn retrieve(&self, requester: Uuid, project_id: Uuid) -> ServiceResult<ProjectView> {
        let project = self.scope.project(requester, project_id).await?;
        self.view(project).await
    }

    pub async fn update(
        &self,
        requester: Uuid,
        project_id: Uuid,
        changes: ProjectChanges,
    ) -> ServiceResult<ProjectView> {
        changes.validate()?;
        self.scope.project(requester, project_id).await?;

        let project = self
            .scope
            .store
            .update_project(
                project_id,
                UpdateProject {
                    name: changes.name,
                    description: changes.description,
                },
            )
            .await?
            .ok_or(ServiceError::NotFound("project"))?;

        self.view(project).await
    }

    /// Deletes the project, its tasks and documents, and every document file
    pub async fn delete(&self, requester: Uuid, project_id: Uuid) -> ServiceResult<()> {
        self.scope.project(requester, project_id).await?;

        let paths = self
            .scope
            .store
            .delete_project(project_id)
            .await?
            .ok_or(ServiceError::NotFound("project"))?;

        self.scope.lifecycle.on_cascade(&paths).await;
        info!(project_id = %project_id, documents = paths.len(), "Project deleted");
        Ok(())
    }

    async fn view(&self, project: Project) -> ServiceResult<ProjectView> {
        let store = &self.scope.store;

        let owner = store
            .find_user(project.owner_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        let counts = store.project_task_counts(project.id).await?;

        let mut tasks = Vec::new();
        for task in store.list_tasks(project.id, project.owner_id).await? {
            tasks.push(TaskView::build(&self.scope, task, project.owner_id).await?);
        }

        Ok(ProjectView {
            project,
            owner,
            tasks,
            tasks_count: counts.tasks_count,
            completed_tasks_count: counts.completed_tasks_count,
        })
    }
}
