/// Physical file storage for document bytes
///
/// The [`FileStore`] trait is the only way the rest of Folio touches file bytes.
/// Paths handed to it are the relative storage paths produced by
/// [`super::path::generate_storage_path`]; each backend decides where they live.
///
/// # Contract
///
/// - `write` persists the full payload or fails without leaving a partial file
/// - `delete` is idempotent: deleting a missing path is `Ok(())`
/// - `exists`/`read` never create anything
///
/// # Example
///
/// ```no_run
/// use folio_shared::files::backend::{FileStore, FilesystemStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FilesystemStore::new("/var/lib/folio/media");
/// store.write("documents/2025/01/03/20250103142501_9f3a01c2_a.txt", b"hello").await?;
/// assert!(store.exists("documents/2025/01/03/20250103142501_9f3a01c2_a.txt").await?);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Error type for file store operations
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    /// Path is absolute or tries to leave the storage root
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    /// Nothing is stored at the path
    #[error("File not found: {0}")]
    NotFound(String),

    /// Underlying I/O failure
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend for document file bytes
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes `data` at `path`, creating parent directories as needed
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), FileStoreError>;

    /// Reads the full contents stored at `path`
    async fn read(&self, path: &str) -> Result<Vec<u8>, FileStoreError>;

    /// Removes the file at `path`; a missing file is not an error
    async fn delete(&self, path: &str) -> Result<(), FileStoreError>;

    /// Checks whether a file is stored at `path`
    async fn exists(&self, path: &str) -> Result<bool, FileStoreError>;
}

/// Local filesystem backend rooted at a media directory
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Creates a backend storing files below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Media root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative storage path below the root
    ///
    /// Rejects absolute paths and any `..`/prefix components.
    fn full_path(&self, path: &str) -> Result<PathBuf, FileStoreError> {
        let relative = Path::new(path);
        if path.is_empty() || relative.is_absolute() {
            return Err(FileStoreError::InvalidPath(path.to_string()));
        }

        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(FileStoreError::InvalidPath(path.to_string())),
            }
        }

        Ok(self.root.join(relative))
    }

    /// Verifies the media root is writable with a write/read/delete probe
    ///
    /// Run once at startup so permission problems show up before the first upload.
    pub async fn validate(&self) -> Result<(), FileStoreError> {
        let probe = ".health-check/probe.bin";
        let data = b"folio-storage-probe";

        self.write(probe, data).await?;
        let read_back = self.read(probe).await?;
        if read_back != data {
            return Err(FileStoreError::Io(std::io::Error::new(
                ErrorKind::InvalidData,
                "storage probe read-back mismatch",
            )));
        }
        self.delete(probe).await?;
        let _ = fs::remove_dir(self.root.join(".health-check")).await;

        Ok(())
    }
}

#[async_trait]
impl FileStore for FilesystemStore {
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), FileStoreError> {
        let full_path = self.full_path(path)?;
        debug!(storage_path = %path, size = data.len(), "file_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "file_store: create_dir_all failed");
                e
            })?;
        }

        // Write to a sibling temp file, then rename into place
        let mut temp_name = full_path.as_os_str().to_owned();
        temp_name.push(".part");
        let temp_path = PathBuf::from(temp_name);

        let result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &full_path).await
        }
        .await;

        if let Err(e) = result {
            warn!(storage_path = %path, error = %e, "file_store: write failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, FileStoreError> {
        let full_path = self.full_path(path)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FileStoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), FileStoreError> {
        let full_path = self.full_path(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(storage_path = %path, "file_store: deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(storage_path = %path, "file_store: delete of missing file");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, FileStoreError> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }
}
