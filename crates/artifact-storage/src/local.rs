//! Filesystem-backed storage backend for local development and tests.
//!
//! [`LocalBackend`] implements the [`StorageBackend`] trait under a base
//! directory. Parent directories play the role of collections and are
//! created on write. Writes land in a temporary sibling file that is renamed
//! over the target, so a reader sees either the old or the new blob, and a
//! failed write leaves nothing behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::BytesMut;
use futures::stream;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use artifact_core::error::ArtifactError;
use artifact_core::path::validate;
use artifact_core::storage::{collect_stream, ByteStream, StorageBackend};
use artifact_core::Result;

/// Read chunk size for streamed reads: 64 KiB.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A [`StorageBackend`] backed by the local filesystem.
///
/// All storage paths are mapped to files under the configured `base_dir`.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    base_dir: PathBuf,
}

impl LocalBackend {
    /// Create a new `LocalBackend` rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await.map_err(|e| {
            ArtifactError::storage(
                format!("Failed to create base directory: {}", base_dir.display()),
                e,
            )
        })?;
        debug!(base_dir = %base_dir.display(), "LocalBackend initialised");
        Ok(Self { base_dir })
    }

    /// Return the full filesystem path for a storage path.
    fn blob_path(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.base_dir.clone(), |acc, segment| acc.join(segment))
    }

    /// Return the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    #[instrument(skip(self), fields(path = %path))]
    async fn exists(&self, path: &str) -> Result<bool> {
        validate(path)?;
        let file = self.blob_path(path);
        let exists = match fs::metadata(&file).await {
            Ok(meta) => meta.is_file(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(ArtifactError::storage(
                    format!("Failed to stat {}", file.display()),
                    e,
                ))
            }
        };
        debug!("exists {} → {}", path, exists);
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn read(&self, path: &str) -> Result<ByteStream> {
        validate(path)?;
        let file_path = self.blob_path(path);
        let file = fs::File::open(&file_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::NotFound {
                    path: path.to_string(),
                }
            } else {
                ArtifactError::storage(format!("Failed to open {}", file_path.display()), e)
            }
        })?;

        // The file handle lives inside the stream state and closes on drop.
        let chunks = stream::try_unfold((file, file_path), |(mut file, file_path)| async move {
            let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
            let n = match file.read_buf(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    return Err(ArtifactError::storage(
                        format!("Failed to read {}", file_path.display()),
                        e,
                    ))
                }
            };
            if n == 0 {
                Ok(None)
            } else {
                Ok(Some((buf.freeze(), (file, file_path))))
            }
        });
        Ok(Box::pin(chunks))
    }

    #[instrument(skip(self, data), fields(path = %path))]
    async fn write(&self, path: &str, data: ByteStream) -> Result<()> {
        validate(path)?;
        let data = collect_stream(data).await?;
        let size = data.len();
        let target = self.blob_path(path);
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());
        fs::create_dir_all(&parent).await.map_err(|e| {
            ArtifactError::storage(
                format!("Failed to create parent directories for {}", target.display()),
                e,
            )
        })?;

        tokio::task::spawn_blocking(move || persist_blob(&parent, &target, &data))
            .await
            .map_err(|e| ArtifactError::Internal {
                message: format!("Blocking task panicked: {e}"),
            })??;

        debug!("Put {} bytes to {}", size, path);
        Ok(())
    }
}

/// Write `data` to a temporary file in `dir`, then rename it onto `target`.
///
/// The temporary file is removed on every error path when it is dropped.
fn persist_blob(dir: &Path, target: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| {
            ArtifactError::storage(
                format!("Failed to create temporary file in {}", dir.display()),
                e,
            )
        })?;
    tmp.write_all(data).map_err(|e| {
        ArtifactError::storage(format!("Failed to write {}", tmp.path().display()), e)
    })?;
    tmp.persist(target).map_err(|e| {
        ArtifactError::storage(
            format!("Failed to move blob into place at {}", target.display()),
            e.error,
        )
    })?;
    Ok(())
}
