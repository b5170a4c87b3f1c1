//! The StorageBackend trait — the single interface for all artifact storage.
//!
//! Callers address opaque blobs by slash-separated storage paths and never
//! talk to the filesystem or a remote store directly. Implementations
//! include `WebDavBackend` (any HTTP/WebDAV origin) and `LocalBackend`
//! (filesystem) in the `artifact-storage` crate.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::TryStreamExt;

use crate::Result;

/// A single-pass stream of blob bytes.
///
/// Dropping the stream releases whatever backs it (a pooled connection or an
/// open file), whether or not it was fully consumed.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// The storage contract every backend implements.
///
/// Each method is one caller-initiated round trip. There is no ordering or
/// mutual exclusion between calls on the same path: concurrent writes race
/// and the last one applied wins. Implementations must be `Send + Sync` so a
/// single instance can be shared across tasks.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Check whether `path` resolves to retrievable content.
    ///
    /// Returns `Ok(false)` only on an authoritative negative answer; transport
    /// failures are errors.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Open a stream over the blob at `path`.
    ///
    /// Fails if the path does not resolve. A missing blob is never reported
    /// as an empty stream.
    async fn read(&self, path: &str) -> Result<ByteStream>;

    /// Store `data` at `path`, replacing any existing content.
    ///
    /// The stream is drained into memory before anything is sent.
    async fn write(&self, path: &str, data: ByteStream) -> Result<()>;

    /// Read the whole blob at `path` into memory.
    async fn read_bytes(&self, path: &str) -> Result<Bytes> {
        let stream = self.read(path).await?;
        collect_stream(stream).await
    }

    /// Store an in-memory blob at `path`.
    async fn write_bytes(&self, path: &str, data: Bytes) -> Result<()> {
        self.write(path, stream_from_bytes(data)).await
    }
}

/// Wrap an in-memory blob as a one-chunk [`ByteStream`].
pub fn stream_from_bytes(data: Bytes) -> ByteStream {
    Box::pin(stream::once(async move { Ok(data) }))
}

/// Drain a [`ByteStream`] into one contiguous buffer.
pub async fn collect_stream(stream: ByteStream) -> Result<Bytes> {
    let buf = stream
        .try_fold(BytesMut::new(), |mut buf, chunk| async move {
            buf.extend_from_slice(&chunk);
            Ok(buf)
        })
        .await?;
    Ok(buf.freeze())
}
