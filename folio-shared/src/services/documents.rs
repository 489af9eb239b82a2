/// Document CRUD under a task
///
/// Uploads, replacements and deletions are delegated to
/// [`crate::documents::DocumentLifecycle`]; this service only adds the access
/// checks and route scoping.

use serde::Serialize;
use uuid::Uuid;

use super::{Scope, ServiceResult};
use crate::documents::Upload;
use crate::models::document::Document;

/// Document with a link to its bytes
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,

    /// Route serving the file contents
    pub file_url: String,
}

impl DocumentView {
    pub fn new(document: Document, project_id: Uuid) -> Self {
        let file_url = download_url(project_id, document.task_id, document.id);
        Self { document, file_url }
    }
}

/// Download route for a document
pub fn download_url(project_id: Uuid, task_id: Uuid, document_id: Uuid) -> String {
    format!(
        "/api/projects/{}/tasks/{}/documents/{}/download",
        project_id, task_id, document_id
    )
}

/// A document's record together with its stored bytes
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub document: Document,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct DocumentService {
    scope: Scope,
}

impl DocumentService {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Documents of a task the requester owns, newest first
    pub async fn list(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
    ) -> ServiceResult<Vec<DocumentView>> {
        self.scope.task(requester, project_id, task_id).await?;

        Ok(self
            .scope
            .store
            .list_documents(task_id, requester)
            .await?
            .into_iter()
            .map(|d| DocumentView::new(d, project_id))
            .collect())
    }

    /// Stores an upload as a new document of `task_id`
    pub async fn create(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        upload: Upload,
        display_name: Option<String>,
    ) -> ServiceResult<DocumentView> {
        self.scope.task(requester, project_id, task_id).await?;

        let document = self
            .scope
            .lifecycle
            .on_create(task_id, upload, display_name)
            .await?;
        Ok(DocumentView::new(document, project_id))
    }

    pub async fn retrieve(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<DocumentView> {
        let document = self
            .scope
            .document(requester, project_id, task_id, document_id)
            .await?;
        Ok(DocumentView::new(document, project_id))
    }

    /// Renames and/or replaces the file of a document
    pub async fn update(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        document_id: Uuid,
        upload: Option<Upload>,
        display_name: Option<String>,
    ) -> ServiceResult<DocumentView> {
        let existing = self
            .scope
            .document(requester, project_id, task_id, document_id)
            .await?;

        let document = self
            .scope
            .lifecycle
            .on_replace(&existing, upload, display_name)
            .await?;
        Ok(DocumentView::new(document, project_id))
    }

    pub async fn delete(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<()> {
        let document = self
            .scope
            .document(requester, project_id, task_id, document_id)
            .await?;

        self.scope.lifecycle.on_delete(&document).await?;
        Ok(())
    }

    /// Reads the stored bytes of a document
    pub async fn download(
        &self,
        requester: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<DocumentContent> {
        let document = self
            .scope
            .document(requester, project_id, task_id, document_id)
            .await?;

        let bytes = self
            .scope
            .lifecycle
            .files()
            .read(&document.storage_path)
            .await?;
        Ok(DocumentContent { document, bytes })
    }
}
