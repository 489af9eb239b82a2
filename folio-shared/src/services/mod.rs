/// Resource services: CRUD over the project → task → document tree
///
/// Each service runs the access gate before touching anything, scopes list
/// queries to the requester in the store, takes parent ids from the route
/// (never the payload) and routes every document side effect through
/// [`DocumentLifecycle`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use folio_shared::files::backend::FilesystemStore;
/// use folio_shared::services::{projects::NewProject, Services};
/// use folio_shared::store::PgStore;
/// use uuid::Uuid;
///
/// # async fn example(store: PgStore, requester: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let services = Services::new(Arc::new(store), Arc::new(FilesystemStore::new("./media")));
///
/// let project = services
///     .projects
///     .create(requester, NewProject { name: "Thesis".into(), description: String::new() })
///     .await?;
/// let tasks = services.tasks.list(requester, project.project.id).await?;
/// assert!(tasks.is_empty());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::authorization::{AccessGate, AuthzError};
use crate::auth::ownership::{OwnableEntity, ResourceRef};
use crate::documents::{DocumentLifecycle, LifecycleError};
use crate::files::backend::{FileStore, FileStoreError};
use crate::models::document::Document;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::store::{Store, StoreError};

pub mod documents;
pub mod projects;
pub mod tasks;

pub use documents::DocumentService;
pub use projects::ProjectService;
pub use tasks::TaskService;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Resource does not exist, or not under the parent named in the route
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    /// File write/read failure
    #[error("File storage error: {0}")]
    Io(#[from] FileStoreError),

    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ServiceError::Conflict(format!("Duplicate value violates {}", constraint))
            }
            // The parent vanished between the access check and the insert
            StoreError::MissingParent => ServiceError::NotFound("parent"),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound(kind) => ServiceError::NotFound(kind),
            AuthzError::Forbidden => ServiceError::Forbidden,
            AuthzError::Store(e) => e.into(),
        }
    }
}

impl From<LifecycleError> for ServiceError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound => ServiceError::NotFound("document"),
            LifecycleError::Conflict => ServiceError::Conflict(
                "Document was modified concurrently, retry with the current version".to_string(),
            ),
            LifecycleError::Files(e) => ServiceError::Io(e),
            LifecycleError::Store(e) => e.into(),
        }
    }
}

/// All three services over one store and file store
#[derive(Clone)]
pub struct Services {
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub documents: DocumentService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, files: Arc<dyn FileStore>) -> Self {
        let scope = Scope {
            gate: AccessGate::new(store.clone()),
            lifecycle: DocumentLifecycle::new(store.clone(), files),
            store,
        };

        Self {
            projects: ProjectService::new(scope.clone()),
            tasks: TaskService::new(scope.clone()),
            documents: DocumentService::new(scope),
        }
    }
}

/// Dependencies and route-scoped lookups shared by the services
///
/// Every lookup checks existence first, then that the object sits under the
/// parent named in the route, then ownership.
#[derive(Clone)]
pub(crate) struct Scope {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) gate: AccessGate,
    pub(crate) lifecycle: DocumentLifecycle,
}

impl Scope {
    /// Project `project_id`, owned by `requester`
    pub(crate) async fn project(&self, requester: Uuid, project_id: Uuid) -> ServiceResult<Project> {
        match self
            .gate
            .authorize_collection(requester, Some(ResourceRef::Project(project_id)))
            .await?
        {
            Some(OwnableEntity::Project(project)) => Ok(project),
            _ => Err(ServiceError::NotFound("project")),
        }
    }

    /// Task `task_id` inside project `project_id`, owned by `requester`
    pub(crate) async fn task(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
    ) -> ServiceResult<Task> {
        self.project(requester, project_id).await?;

        let task = self
            .store
            .find_task(task_id)
            .await?
            .filter(|t| t.project_id == project_id)
            .ok_or(ServiceError::NotFound("task"))?;

        self.gate
            .authorize_instance(requester, &OwnableEntity::Task(task.clone()))
            .await?;
        Ok(task)
    }

    /// Document `document_id` inside the given task and project
    pub(crate) async fn document(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<Document> {
        self.task(requester, project_id, task_id).await?;

        let document = self
            .store
            .find_document(document_id)
            .await?
            .filter(|d| d.task_id == task_id)
            .ok_or(ServiceError::NotFound("document"))?;

        self.gate
            .authorize_instance(requester, &OwnableEntity::Document(document.clone()))
            .await?;
        Ok(document)
    }
}

/// Deserializes a present field (including an explicit `null`) as `Some`
///
/// Paired with `#[serde(default)]` this tells "absent" (`None`) apart from
/// "set to null" (`Some(None)`).
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::files::backend::FilesystemStore;
    use crate::models::user::CreateUser;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    pub(crate) struct Harness {
        pub dir: TempDir,
        pub store: Arc<MemoryStore>,
        pub files: Arc<FilesystemStore>,
        pub services: Services,
        pub alice: Uuid,
        pub bob: Uuid,
    }

    pub(crate) async fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let files = Arc::new(FilesystemStore::new(dir.path()));
        let services = Services::new(store.clone(), files.clone());

        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let user = store
                .create_user(CreateUser {
                    username: name.to_string(),
                    email: format!("{}@example.com", name),
                    password_hash: "hash".to_string(),
                    first_name: String::new(),
                    last_name: String::new(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }

        Harness {
            dir,
            store,
            files,
            services,
            alice: ids[0],
            bob: ids[1],
        }
    }

    /// Every file currently under the media root
    pub(crate) fn stored_files(h: &Harness) -> Vec<std::path::PathBuf> {
        fn walk(dir: &std::path::Path, out: &mut Vec<std::path::PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.push(path);
                }
            }
        }

        let mut out = Vec::new();
        walk(h.dir.path(), &mut out);
        out
    }
}
