/// Request-time access decisions
///
/// [`AccessGate`] answers two questions for every request, both by walking the
/// ownership chain with an [`OwnershipResolver`]:
///
/// - **collection**: may the requester list or create under this parent?
/// - **instance**: may the requester read, change or delete this object?
///
/// The gate never mutates anything.
///
/// # Not found vs forbidden
///
/// A route parameter naming a resource that does not exist yields
/// [`AuthzError::NotFound`]. A resource that exists but belongs to someone
/// else yields [`AuthzError::Forbidden`]. The two are checked separately and
/// always in that order.
///
/// # Example
///
/// ```no_run
/// use folio_shared::auth::authorization::{AccessGate, AuthzError};
/// use folio_shared::auth::ownership::ResourceRef;
/// use uuid::Uuid;
///
/// # async fn example(gate: AccessGate, requester: Uuid, project_id: Uuid) -> Result<(), AuthzError> {
/// // Before creating a task under a project taken from the URL
/// let parent = gate
///     .authorize_collection(requester, Some(ResourceRef::Project(project_id)))
///     .await?;
/// assert!(parent.is_some());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use uuid::Uuid;

use super::ownership::{OwnableEntity, OwnershipResolver, ResourceRef};
use crate::store::{Store, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The named resource (or one of its ancestors) does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The resource exists but the requester does not own it
    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ownership-based access gate
#[derive(Clone)]
pub struct AccessGate {
    resolver: OwnershipResolver,
}

impl AccessGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            resolver: OwnershipResolver::new(store),
        }
    }

    pub fn resolver(&self) -> &OwnershipResolver {
        &self.resolver
    }

    /// Collection-level check
    ///
    /// With a parent, loads it and requires the requester to own it, handing
    /// the loaded parent back. Without one (the top-level project collection)
    /// the check passes and the caller must scope its query to the requester.
    pub async fn authorize_collection(
        &self,
        requester: Uuid,
        parent: Option<ResourceRef>,
    ) -> Result<Option<OwnableEntity>, AuthzError> {
        let Some(reference) = parent else {
            return Ok(None);
        };

        let entity = self.resolver.load(reference).await?;
        self.authorize_instance(requester, &entity).await?;
        Ok(Some(entity))
    }

    /// Instance-level check on an already loaded object
    pub async fn authorize_instance(
        &self,
        requester: Uuid,
        entity: &OwnableEntity,
    ) -> Result<(), AuthzError> {
        let owner = self.resolver.resolve(entity).await?;

        if owner != requester {
            tracing::debug!(
                kind = entity.kind(),
                id = %entity.id(),
                requester = %requester,
                "Access denied"
            );
            return Err(AuthzError::Forbidden);
        }

        Ok(())
    }
}
