//! Core contract for artifact storage.
//!
//! This crate defines what every storage backend provides: the
//! [`StorageBackend`] trait over a path-addressed blob namespace, the
//! [`BackendConfig`] used to reach a remote store, storage path helpers, and
//! the unified error type.

pub mod config;
pub mod error;
pub mod path;
pub mod storage;

pub use config::BackendConfig;
pub use error::ArtifactError;
pub use storage::{collect_stream, stream_from_bytes, ByteStream, StorageBackend};

/// Convenience Result type using [`ArtifactError`].
pub type Result<T> = std::result::Result<T, ArtifactError>;
