/// Ownership resolution along the Document → Task → Project → User chain
///
/// Ownership is never stored on tasks or documents. Every check walks up the
/// chain through the [`Store`], so moving a resource to a different owner is
/// impossible by construction: the only owner field is `projects.owner_id`,
/// which is written once.

use std::sync::Arc;

use uuid::Uuid;

use super::authorization::AuthzError;
use crate::models::document::Document;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::store::Store;

/// Any resource that has an owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnableEntity {
    Project(Project),
    Task(Task),
    Document(Document),
}

impl OwnableEntity {
    /// Human-readable kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            OwnableEntity::Project(_) => "project",
            OwnableEntity::Task(_) => "task",
            OwnableEntity::Document(_) => "document",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            OwnableEntity::Project(p) => p.id,
            OwnableEntity::Task(t) => t.id,
            OwnableEntity::Document(d) => d.id,
        }
    }
}

/// A not-yet-loaded parent resource named by a route parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef {
    Project(Uuid),
    Task(Uuid),
}

impl ResourceRef {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceRef::Project(_) => "project",
            ResourceRef::Task(_) => "task",
        }
    }
}

/// Resolves the owning user of any resource
#[derive(Clone)]
pub struct OwnershipResolver {
    store: Arc<dyn Store>,
}

impl OwnershipResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the id of the user at the top of `entity`'s chain
    ///
    /// # Errors
    ///
    /// [`AuthzError::NotFound`] if an ancestor disappeared (for example a
    /// project deleted between loading a task and resolving it).
    pub async fn resolve(&self, entity: &OwnableEntity) -> Result<Uuid, AuthzError> {
        match entity {
            OwnableEntity::Project(project) => Ok(project.owner_id),
            OwnableEntity::Task(task) => self.project_owner(task.project_id).await,
            OwnableEntity::Document(document) => self.task_owner(document.task_id).await,
        }
    }

    /// Loads the resource behind a route parameter
    ///
    /// Existence is checked on its own, before and independently of ownership.
    pub async fn load(&self, reference: ResourceRef) -> Result<OwnableEntity, AuthzError> {
        let entity = match reference {
            ResourceRef::Project(id) => self.store.find_project(id).await?.map(OwnableEntity::Project),
            ResourceRef::Task(id) => self.store.find_task(id).await?.map(OwnableEntity::Task),
        };

        entity.ok_or(AuthzError::NotFound(reference.kind()))
    }

    async fn project_owner(&self, project_id: Uuid) -> Result<Uuid, AuthzError> {
        self.store
            .find_project(project_id)
            .await?
            .map(|p| p.owner_id)
            .ok_or(AuthzError::NotFound("project"))
    }

    async fn task_owner(&self, task_id: Uuid) -> Result<Uuid, AuthzError> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(AuthzError::NotFound("task"))?;

        self.project_owner(task.project_id).await
    }
}
