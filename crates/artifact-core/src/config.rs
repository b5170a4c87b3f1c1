//! Backend configuration.
//!
//! [`BackendConfig`] describes how to reach a remote store: the base address,
//! an optional query suffix appended to every request address (some servers
//! carry credentials there), static headers sent with every request, the
//! cache max-age for existence checks and reads, and connection pool tuning. It is
//! built once and cloned into the backend, which never mutates it.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::Result;

/// Default number of idle pooled connections kept per host.
const DEFAULT_POOL_MAX_IDLE: usize = 5;

/// Default keep-alive for an idle pooled connection: 5 minutes.
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Default TCP/TLS connect timeout: 10 seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for an HTTP/WebDAV storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base address, e.g. `https://store.example/art`.
    pub base_url: String,

    /// Appended verbatim after the path, e.g. `?token=abc`.
    #[serde(default)]
    pub query_suffix: String,

    /// Headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// `Cache-Control: max-age` for existence checks and reads. Zero always revalidates.
    #[serde(default)]
    pub max_cache_age_secs: u64,

    /// Maximum idle connections kept per host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle: usize,

    /// How long an idle connection stays in the pool.
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,

    /// Connect timeout; the only deadline the backend imposes.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_pool_max_idle() -> usize {
    DEFAULT_POOL_MAX_IDLE
}

fn default_pool_idle_timeout_secs() -> u64 {
    DEFAULT_POOL_IDLE_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl BackendConfig {
    /// Create a configuration with default settings for `base_url`.
    ///
    /// # Example
    ///
    /// ```
    /// use artifact_core::config::BackendConfig;
    ///
    /// let config = BackendConfig::new("https://store.example/art")
    ///     .with_header("X-Team", "deps")
    ///     .with_max_cache_age(60);
    /// assert_eq!(config.query_suffix, "");
    /// assert_eq!(config.max_cache_age_secs, 60);
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            query_suffix: String::new(),
            headers: BTreeMap::new(),
            max_cache_age_secs: 0,
            pool_max_idle: DEFAULT_POOL_MAX_IDLE,
            pool_idle_timeout_secs: DEFAULT_POOL_IDLE_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Split a full URL at its first `?` into base address and query suffix.
    ///
    /// `https://h/art?sig=x` → base `https://h/art`, suffix `?sig=x`.
    pub fn from_url(url: &str) -> Self {
        match url.find('?') {
            Some(idx) => Self::new(&url[..idx]).with_query_suffix(&url[idx..]),
            None => Self::new(url),
        }
    }

    /// Set the query suffix appended to every address.
    pub fn with_query_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.query_suffix = suffix.into();
        self
    }

    /// Add a static header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the cache max-age, in seconds, for existence checks and reads.
    pub fn with_max_cache_age(mut self, secs: u64) -> Self {
        self.max_cache_age_secs = secs;
        self
    }

    /// Check that the base address is an absolute HTTP(S) URL.
    pub fn validate(&self) -> Result<()> {
        let rest = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"))
            .ok_or_else(|| {
                ArtifactError::config(format!(
                    "base URL must start with http:// or https://: '{}'",
                    self.base_url
                ))
            })?;
        if rest.trim_matches('/').is_empty() {
            return Err(ArtifactError::config(format!(
                "base URL has no host: '{}'",
                self.base_url
            )));
        }
        if rest.contains('?') {
            return Err(ArtifactError::config(format!(
                "base URL must not carry a query, use the query suffix: '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Idle keep-alive as a [`Duration`].
    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
