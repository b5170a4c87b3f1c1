//! Unified error type for artifact storage.
//!
//! Every backend failure surfaces as an [`ArtifactError`]. Non-success HTTP
//! responses keep their address, status, and message as separate fields so
//! callers can branch on the status without parsing strings. Library code
//! never uses `unwrap()`; all fallible operations return
//! `Result<T, ArtifactError>`.

use thiserror::Error;

/// The unified error type for all storage operations.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// A transport or I/O failure (connection refused, reset, DNS, timeout,
    /// filesystem error).
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable description of the failure.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The origin answered with a non-success status.
    #[error("{address} returned {status} {message}")]
    Http {
        /// The full request address, including any query suffix.
        address: String,
        /// Numeric HTTP status code.
        status: u16,
        /// Reason phrase for the status, e.g. `Forbidden`.
        ///
        /// This is the standard phrase for the code. The HTTP client does not
        /// expose the phrase the server actually sent.
        message: String,
    },

    /// The origin reported success but sent no content body.
    #[error("{address} returned success without a response body")]
    MissingBody {
        /// The full request address.
        address: String,
    },

    /// The requested path does not resolve to a blob.
    #[error("Not found: {path}")]
    NotFound {
        /// The storage path that was not found.
        path: String,
    },

    /// The caller supplied a path that cannot address a blob.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid configuration was provided.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// An internal error (bug).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl ArtifactError {
    /// Create a storage error from a message and source error.
    pub fn storage(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error from a message only.
    pub fn storage_msg(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the error means "no blob at this path".
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Http { status, .. } => *status == 404,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_carries_context() {
        let err = ArtifactError::Http {
            address: "https://store.example/art/a.yml".into(),
            status: 403,
            message: "Forbidden".into(),
        };
        assert_eq!(
            err.to_string(),
            "https://store.example/art/a.yml returned 403 Forbidden"
        );
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_classification() {
        let http_404 = ArtifactError::Http {
            address: "http://h/x".into(),
            status: 404,
            message: "Not Found".into(),
        };
        assert!(http_404.is_not_found());
        assert!(ArtifactError::NotFound { path: "x".into() }.is_not_found());
        assert!(!ArtifactError::storage_msg("connection reset").is_not_found());
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = ArtifactError::storage("HEAD http://h/x failed", io);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("reset"));
        assert_eq!(err.status(), None);
    }
}
