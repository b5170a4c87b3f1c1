//! A small in-memory WebDAV origin mounted on a wiremock server.
//!
//! It behaves like a strict WebDAV server: `PUT` answers 404 when the parent
//! collection is missing, `MKCOL` creates exactly one level and answers 405
//! for an existing collection and 409 for a missing parent. Every request is
//! logged so tests can assert exact request sequences.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use artifact_core::config::BackendConfig;
use artifact_storage::WebDavBackend;

/// Collection every test backend is rooted at.
pub const ROOT: &str = "/dav/";

/// One request as seen by the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logged {
    pub method: String,
    pub path: String,
    pub status: u16,
}

#[derive(Default)]
struct DavState {
    collections: HashSet<String>,
    blobs: HashMap<String, Vec<u8>>,
    log: Vec<Logged>,
}

/// Shared handle to the fake origin's state.
#[derive(Clone)]
pub struct FakeDav {
    state: Arc<Mutex<DavState>>,
}

impl FakeDav {
    /// Start a mock server with only `/` and [`ROOT`] present.
    pub async fn start() -> (MockServer, FakeDav) {
        init_tracing();
        let server = MockServer::start().await;
        let mut state = DavState::default();
        state.collections.insert("/".to_string());
        state.collections.insert(ROOT.to_string());
        let dav = FakeDav {
            state: Arc::new(Mutex::new(state)),
        };

        let handler = dav.clone();
        Mock::given(any())
            .respond_with(move |request: &Request| handler.respond(request))
            .mount(&server)
            .await;

        (server, dav)
    }

    /// A backend pointed at [`ROOT`] on `server`.
    pub fn backend(server: &MockServer) -> WebDavBackend {
        Self::backend_with(BackendConfig::new(format!("{}/dav", server.uri())))
    }

    pub fn backend_with(config: BackendConfig) -> WebDavBackend {
        WebDavBackend::new(config).expect("backend should build")
    }

    /// Requests seen so far, in arrival order.
    pub fn log(&self) -> Vec<Logged> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    /// `(method, path)` pairs of the logged requests.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.log()
            .into_iter()
            .map(|l| (l.method, l.path))
            .collect()
    }

    pub fn has_collection(&self, path: &str) -> bool {
        self.state.lock().unwrap().collections.contains(path)
    }

    pub fn add_collection(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(path.to_string());
    }

    pub fn blob(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().blobs.get(path).cloned()
    }

    fn respond(&self, request: &Request) -> ResponseTemplate {
        let method = request.method.as_str().to_string();
        let path = request.url.path().to_string();

        let mut state = self.state.lock().unwrap();
        let (status, body) = match method.as_str() {
            "HEAD" => {
                if state.blobs.contains_key(&path) {
                    (200, None)
                } else {
                    (404, None)
                }
            }
            "GET" => match state.blobs.get(&path) {
                Some(data) => (200, Some(data.clone())),
                None => (404, None),
            },
            "PUT" => {
                if state.collections.contains(parent_of(&path)) {
                    let replaced = state.blobs.insert(path.clone(), request.body.clone());
                    (if replaced.is_some() { 204 } else { 201 }, None)
                } else {
                    (404, None)
                }
            }
            "MKCOL" => {
                if state.collections.contains(&path) {
                    (405, None)
                } else if !state.collections.contains(parent_of(path.trim_end_matches('/'))) {
                    (409, None)
                } else {
                    state.collections.insert(path.clone());
                    (201, None)
                }
            }
            _ => (405, None),
        };

        state.log.push(Logged {
            method,
            path,
            status,
        });

        let response = ResponseTemplate::new(status);
        match body {
            Some(data) => response.set_body_bytes(data),
            None => response,
        }
    }
}

/// The collection containing `path`, with its trailing `/`.
fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    }
}

/// Route backend logs to the test harness; `RUST_LOG=debug` shows requests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
