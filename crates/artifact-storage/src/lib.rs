//! Storage backend implementations for artifact storage.
//!
//! This crate provides concrete implementations of the
//! [`StorageBackend`](artifact_core::StorageBackend) trait:
//!
//! - [`WebDavBackend`] — any HTTP/WebDAV origin, creating missing collections on write
//! - [`LocalBackend`] — filesystem-backed storage for development and tests
//!
//! [`open_backend`] picks one from a storage URI.

pub mod local;
pub mod webdav;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use artifact_core::config::BackendConfig;
use artifact_core::error::ArtifactError;
use artifact_core::storage::StorageBackend;
use artifact_core::Result;

pub use local::LocalBackend;
pub use webdav::WebDavBackend;

/// Open the backend addressed by `uri`.
///
/// - `http://…` / `https://…` → [`WebDavBackend`]; anything after the first
///   `?` becomes the query suffix.
/// - `file://<path>` or a bare path → [`LocalBackend`]; a leading `~/`
///   expands to the home directory.
pub async fn open_backend(uri: &str) -> Result<Arc<dyn StorageBackend>> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        let config = BackendConfig::from_url(uri);
        let backend = WebDavBackend::new(config)?;
        info!(base = %backend.config().base_url, "Opened WebDAV storage");
        return Ok(Arc::new(backend));
    }

    let path = uri.strip_prefix("file://").unwrap_or(uri);
    if path.is_empty() {
        return Err(ArtifactError::config("storage URI has no path"));
    }
    let expanded = if let Some(rest) = path.strip_prefix("~/") {
        let home = home_dir().ok_or_else(|| {
            ArtifactError::config("Cannot determine home directory")
        })?;
        home.join(rest)
    } else {
        PathBuf::from(path)
    };

    let backend = LocalBackend::new(expanded).await?;
    info!(base_dir = %backend.base_dir().display(), "Opened local storage");
    Ok(Arc::new(backend))
}

/// Best-effort home directory detection.
fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
