/// Document file lifecycle
///
/// [`DocumentLifecycle`] keeps document records and their physical files in
/// step. Every create, replace and delete of a document (direct or through a
/// project/task cascade) goes through it, so a record never points at a
/// missing file and no file outlives its record.
///
/// # Ordering
///
/// | Operation | Sequence |
/// |-----------|----------|
/// | create    | write new file → insert record (file removed if insert fails) |
/// | replace   | write new file → compare-and-swap path → delete old file |
/// | delete    | remove record (returning its path) → delete file |
/// | cascade   | store removes the subtree (returning paths) → delete each file |
///
/// The compare-and-swap on replace is keyed by document id and the path read
/// before the write, which serialises a replace against a concurrent replace
/// or delete of the same document without an in-process lock.
///
/// File deletions never fail an operation: errors are logged and swallowed.
/// File writes abort the operation before any record is touched.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::files::backend::{FileStore, FileStoreError};
use crate::files::path::generate_storage_path;
use crate::models::document::{CreateDocument, Document};
use crate::store::{Store, StoreError};

/// Display name used when neither the client nor the upload supplies one
pub const UNNAMED: &str = "Unnamed";

/// Longest display name, matching the `documents.file_name` column
pub const MAX_FILE_NAME_CHARS: usize = 255;

/// Cuts a display name to [`MAX_FILE_NAME_CHARS`] characters
fn fit_display_name(mut name: String) -> String {
    if let Some((idx, _)) = name.char_indices().nth(MAX_FILE_NAME_CHARS) {
        name.truncate(idx);
    }
    name
}

/// An uploaded file payload
#[derive(Debug, Clone)]
pub struct Upload {
    /// File name as sent by the client
    pub file_name: String,

    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The document disappeared while the operation was in flight
    #[error("document not found")]
    NotFound,

    /// The document's file was replaced by someone else in the meantime
    #[error("document was modified concurrently, retry with the current version")]
    Conflict,

    /// Writing the file failed; nothing was changed
    #[error(transparent)]
    Files(#[from] FileStoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coordinates document records with the file store
#[derive(Clone)]
pub struct DocumentLifecycle {
    store: Arc<dyn Store>,
    files: Arc<dyn FileStore>,
}

impl DocumentLifecycle {
    pub fn new(store: Arc<dyn Store>, files: Arc<dyn FileStore>) -> Self {
        Self { store, files }
    }

    pub fn files(&self) -> &Arc<dyn FileStore> {
        &self.files
    }

    /// Stores an upload and creates its document record under `task_id`
    ///
    /// The display name is `display_name` if given, else the upload's own name,
    /// cut to [`MAX_FILE_NAME_CHARS`].
    pub async fn on_create(
        &self,
        task_id: Uuid,
        upload: Upload,
        display_name: Option<String>,
    ) -> Result<Document, LifecycleError> {
        let storage_path = generate_storage_path(&upload.file_name);
        self.files.write(&storage_path, &upload.bytes).await?;

        let file_name = display_name
            .filter(|name| !name.is_empty())
            .or_else(|| Some(upload.file_name).filter(|name| !name.is_empty()))
            .map(fit_display_name)
            .unwrap_or_else(|| UNNAMED.to_string());

        let created = self
            .store
            .create_document(CreateDocument {
                task_id,
                file_name,
                storage_path: storage_path.clone(),
            })
            .await;

        match created {
            Ok(document) => {
                info!(
                    document_id = %document.id,
                    task_id = %task_id,
                    size = upload.bytes.len(),
                    "Document stored"
                );
                Ok(document)
            }
            Err(e) => {
                // Record never existed, so the file is an orphan
                self.remove_file(&storage_path).await;
                Err(e.into())
            }
        }
    }

    /// Updates a document, replacing its file if a different payload is given
    ///
    /// Without an upload, or with one whose bytes equal the stored file, only
    /// the display name changes (if supplied). Otherwise the new bytes go to a
    /// fresh path, the record is swapped over only if it still points at
    /// `existing.storage_path`, and only then is the old file deleted.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Files`] if the new file can't be written; the old
    ///   file and record are untouched
    /// - [`LifecycleError::NotFound`] if the document was deleted meanwhile
    /// - [`LifecycleError::Conflict`] if another replace won the race
    pub async fn on_replace(
        &self,
        existing: &Document,
        upload: Option<Upload>,
        display_name: Option<String>,
    ) -> Result<Document, LifecycleError> {
        let Some(upload) = upload else {
            return self.rename(existing, display_name).await;
        };

        if self.same_content(&existing.storage_path, &upload.bytes).await {
            debug!(document_id = %existing.id, "Uploaded bytes match stored file");
            return self.rename(existing, display_name).await;
        }

        let new_path = generate_storage_path(&upload.file_name);
        self.files.write(&new_path, &upload.bytes).await?;

        let display_name = display_name
            .filter(|name| !name.is_empty())
            .map(fit_display_name);
        let swapped = self
            .store
            .swap_document_path(
                existing.id,
                &existing.storage_path,
                &new_path,
                display_name.as_deref(),
            )
            .await;

        match swapped {
            Ok(Some(document)) => {
                self.remove_file(&existing.storage_path).await;
                info!(
                    document_id = %document.id,
                    size = upload.bytes.len(),
                    "Document file replaced"
                );
                Ok(document)
            }
            Ok(None) => {
                self.remove_file(&new_path).await;
                match self.store.find_document(existing.id).await? {
                    Some(_) => Err(LifecycleError::Conflict),
                    None => Err(LifecycleError::NotFound),
                }
            }
            Err(e) => {
                self.remove_file(&new_path).await;
                Err(e.into())
            }
        }
    }

    /// Deletes a document record and then its file
    pub async fn on_delete(&self, document: &Document) -> Result<(), LifecycleError> {
        let path = self
            .store
            .delete_document(document.id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        // The path comes from the deleted row, which may be newer than `document`
        self.remove_file(&path).await;
        info!(document_id = %document.id, "Document deleted");
        Ok(())
    }

    /// Deletes the files of documents removed by a project or task cascade
    pub async fn on_cascade(&self, storage_paths: &[String]) {
        for path in storage_paths {
            self.remove_file(path).await;
        }
        if !storage_paths.is_empty() {
            info!(files = storage_paths.len(), "Cascade file cleanup finished");
        }
    }

    async fn rename(
        &self,
        existing: &Document,
        display_name: Option<String>,
    ) -> Result<Document, LifecycleError> {
        let display_name = display_name
            .filter(|name| !name.is_empty())
            .map(fit_display_name);
        let renamed = match display_name {
            Some(name) => self.store.rename_document(existing.id, &name).await?,
            None => self.store.find_document(existing.id).await?,
        };

        renamed.ok_or(LifecycleError::NotFound)
    }

    async fn same_content(&self, path: &str, bytes: &[u8]) -> bool {
        match self.files.read(path).await {
            Ok(current) => current == bytes,
            Err(e) => {
                debug!(path, error = %e, "Current file unreadable, treating upload as new");
                false
            }
        }
    }

    async fn remove_file(&self, path: &str) {
        if let Err(e) = self.files.delete(path).await {
            warn!(path, error = %e, "Failed to delete document file");
        }
    }
}
