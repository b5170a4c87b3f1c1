//! HTTP/WebDAV storage backend.
//!
//! [`WebDavBackend`] implements the [`StorageBackend`] trait against any
//! origin that accepts `HEAD`, `GET` and `PUT` on resource URLs and `MKCOL`
//! for collections (Apache mod_dav, nginx dav, Nextcloud, Artifactory, ...).
//!
//! WebDAV servers refuse a `PUT` whose parent collection is missing, and
//! `MKCOL` only creates one level at a time. A write that comes back `404`
//! therefore creates every ancestor collection root-to-leaf and retries the
//! `PUT` exactly once. Any other failure status is returned immediately.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument, warn};

use artifact_core::config::BackendConfig;
use artifact_core::error::ArtifactError;
use artifact_core::path::{encode_path, parent_collections, validate};
use artifact_core::storage::{collect_stream, ByteStream, StorageBackend};
use artifact_core::Result;

/// A [`StorageBackend`] backed by an HTTP/WebDAV origin.
///
/// One instance owns one connection pool, created in [`WebDavBackend::new`]
/// and shared by every request, including concurrent ones. Static headers
/// from the configuration are installed as client defaults.
pub struct WebDavBackend {
    client: Client,
    mkcol: Method,
    config: BackendConfig,
    /// `config.base_url` with exactly one trailing `/`.
    base: String,
}

impl WebDavBackend {
    /// Create a backend and its connection pool.
    ///
    /// Fails with [`ArtifactError::Config`] if the base address is not an
    /// HTTP(S) URL or a static header is not a valid HTTP header.
    pub fn new(config: BackendConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .default_headers(static_headers(&config)?)
            .pool_max_idle_per_host(config.pool_max_idle)
            .pool_idle_timeout(config.pool_idle_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ArtifactError::storage("Failed to build HTTP client", e))?;

        let mkcol = Method::from_bytes(b"MKCOL").map_err(|e| ArtifactError::Internal {
            message: format!("MKCOL is not a valid HTTP method: {e}"),
        })?;

        let base = format!("{}/", config.base_url.trim_end_matches('/'));

        debug!(
            base = %base,
            max_cache_age_secs = config.max_cache_age_secs,
            pool_max_idle = config.pool_max_idle,
            "WebDavBackend initialised"
        );

        Ok(Self {
            client,
            mkcol,
            config,
            base,
        })
    }

    /// The configuration this backend was built from.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// The request address for `path`: base, encoded path, query suffix.
    ///
    /// Each segment is percent-encoded so `?`, `#`, `\` and `%2F` inside a
    /// segment cannot end the path or add a segment boundary.
    pub fn address(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base,
            encode_path(path.trim_start_matches('/')),
            self.config.query_suffix
        )
    }

    fn cache_control(&self) -> String {
        format!("max-age={}", self.config.max_cache_age_secs)
    }

    /// Send a request, mapping transport failures to storage errors.
    async fn send(&self, request: RequestBuilder, method: &str, address: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| ArtifactError::storage(format!("{method} {address} failed"), e))
    }

    async fn put(&self, address: &str, body: Bytes) -> Result<Response> {
        self.send(self.client.put(address).body(body), "PUT", address)
            .await
    }

    /// Best-effort `MKCOL` for every ancestor collection of `path`.
    ///
    /// Failures are logged and ignored: an existing collection answers
    /// `405`, and the retried `PUT` decides the outcome.
    async fn create_collections(&self, path: &str) {
        for collection in parent_collections(path) {
            let address = self.address(&collection);
            let request = self.client.request(self.mkcol.clone(), &address);
            match self.send(request, "MKCOL", &address).await {
                Ok(response) => {
                    debug!(address = %address, status = %response.status(), "MKCOL");
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "MKCOL failed");
                }
            }
        }
    }
}

#[async_trait]
impl StorageBackend for WebDavBackend {
    #[instrument(skip(self), fields(path = %path))]
    async fn exists(&self, path: &str) -> Result<bool> {
        validate(path)?;
        let address = self.address(path);
        let request = self
            .client
            .head(&address)
            .header(CACHE_CONTROL, self.cache_control());
        let response = self.send(request, "HEAD", &address).await?;
        let exists = response.status().is_success();
        debug!("exists {} → {} ({})", path, exists, response.status());
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn read(&self, path: &str) -> Result<ByteStream> {
        validate(path)?;
        let address = self.address(path);
        let request = self
            .client
            .get(&address)
            .header(CACHE_CONTROL, self.cache_control());
        let response = self.send(request, "GET", &address).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(&address, status));
        }
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return Err(ArtifactError::MissingBody { address });
        }

        debug!(
            content_length = ?response.content_length(),
            "GET {} → {}",
            path,
            status
        );
        let stream = response.bytes_stream().map_err(move |e| {
            ArtifactError::storage(format!("Reading response body from {address} failed"), e)
        });
        Ok(Box::pin(stream))
    }

    #[instrument(skip(self, data), fields(path = %path))]
    async fn write(&self, path: &str, data: ByteStream) -> Result<()> {
        validate(path)?;
        let body = collect_stream(data).await?;
        let address = self.address(path);

        let status = self.put(&address, body.clone()).await?.status();
        if status.is_success() {
            debug!("Put {} bytes to {}", body.len(), path);
            return Ok(());
        }
        if status != StatusCode::NOT_FOUND {
            return Err(http_error(&address, status));
        }

        debug!("PUT {} → 404, creating parent collections", path);
        self.create_collections(path).await;

        let status = self.put(&address, body.clone()).await?.status();
        if !status.is_success() {
            return Err(http_error(&address, status));
        }
        debug!("Put {} bytes to {} after creating collections", body.len(), path);
        Ok(())
    }
}

impl fmt::Debug for WebDavBackend {
    // Header values and the query suffix may carry credentials.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavBackend")
            .field("base", &self.base)
            .field("headers", &self.config.headers.keys().collect::<Vec<_>>())
            .field("max_cache_age_secs", &self.config.max_cache_age_secs)
            .finish_non_exhaustive()
    }
}

/// Build the default header map from the configured static headers.
fn static_headers(config: &BackendConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(config.headers.len());
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ArtifactError::config(format!("invalid header name '{name}'")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ArtifactError::config(format!("invalid value for header '{name}'")))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn http_error(address: &str, status: StatusCode) -> ArtifactError {
    ArtifactError::Http {
        address: address.to_string(),
        status: status.as_u16(),
        message: status.canonical_reason().unwrap_or_default().to_string(),
    }
}
