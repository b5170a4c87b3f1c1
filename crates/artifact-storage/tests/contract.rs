//! Integration test: every backend honours the same storage contract.
//!
//! absent → write → read back → overwrite → nested write, run once against
//! the filesystem backend and once against the WebDAV backend.

mod common;

use bytes::Bytes;
use futures::stream;

use artifact_core::storage::{ByteStream, StorageBackend};
use artifact_storage::LocalBackend;
use common::FakeDav;

fn chunked(parts: &[&'static str]) -> ByteStream {
    let chunks: Vec<artifact_core::Result<Bytes>> = parts
        .iter()
        .map(|p| Ok(Bytes::from_static(p.as_bytes())))
        .collect();
    Box::pin(stream::iter(chunks))
}

async fn check_contract(backend: &dyn StorageBackend) {
    // Absent paths: exists is false, read fails with not-found.
    assert!(!backend.exists("proj1/result.yml").await.unwrap());
    let err = backend.read("proj1/result.yml").await.err().unwrap();
    assert!(err.is_not_found(), "expected not-found, got {err}");

    // Multi-chunk input is stored as one blob.
    backend
        .write("proj1/result.yml", chunked(&["deps:", " [", "a, b]"]))
        .await
        .unwrap();
    assert!(backend.exists("proj1/result.yml").await.unwrap());
    assert_eq!(
        backend.read_bytes("proj1/result.yml").await.unwrap(),
        Bytes::from_static(b"deps: [a, b]")
    );

    // Overwrite replaces wholesale, including with shorter content.
    backend
        .write_bytes("proj1/result.yml", Bytes::from_static(b"[]"))
        .await
        .unwrap();
    assert_eq!(
        backend.read_bytes("proj1/result.yml").await.unwrap(),
        Bytes::from_static(b"[]")
    );

    // Missing ancestors are created implicitly.
    backend
        .write_bytes("a/b/c/file.txt", Bytes::from_static(b"nested"))
        .await
        .unwrap();
    assert_eq!(
        backend.read_bytes("a/b/c/file.txt").await.unwrap(),
        Bytes::from_static(b"nested")
    );

    // Siblings are independent.
    assert!(!backend.exists("proj1/other.yml").await.unwrap());
}

#[tokio::test]
async fn test_local_backend_contract() {
    let tmp = tempfile::TempDir::new().unwrap();
    let backend = LocalBackend::new(tmp.path()).await.unwrap();
    check_contract(&backend).await;
}

#[tokio::test]
async fn test_webdav_backend_contract() {
    let (server, _dav) = FakeDav::start().await;
    let backend = FakeDav::backend(&server);
    check_contract(&backend).await;
}
