//! Error types and utilities for keyrole

use thiserror::Error;

/// Result type alias for keyrole operations
pub type Result<T> = std::result::Result<T, KeyroleError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Coarse failure categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The storage backend was never reached; the store runs as a no-op.
    BackendUnavailable,
    /// A single backend operation failed. Not retried.
    Backend,
    /// Missing rights to grant a role or post a message.
    PermissionDenied,
    /// The interactive response window has passed.
    DeadlineExceeded,
    /// Stored state could not be understood and was treated as absent.
    MalformedState,
    /// Process configuration is invalid.
    Config,
    /// User input was rejected.
    Validation,
    /// Any other Discord API failure.
    Discord,
    /// Local I/O or serialization failure.
    Internal,
}

/// Main error type for keyrole operations
#[derive(Error, Debug)]
pub enum KeyroleError {
    /// The configured backend could not be reached at startup
    #[error("Storage backend unavailable: {backend}")]
    BackendUnavailable {
        backend: String,
    },

    /// A storage operation failed
    #[error("Storage error ({backend}): {message}")]
    Backend {
        backend: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Discord refused an action for lack of permissions
    #[error("Permission denied: {message}")]
    PermissionDenied {
        message: String,
    },

    /// The interaction acknowledgment window has passed
    #[error("Response deadline exceeded: {message}")]
    DeadlineExceeded {
        message: String,
    },

    /// Stored data was corrupt or had an unexpected shape
    #[error("Malformed stored state: {message}")]
    MalformedState {
        message: String,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Validation errors for user input
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Discord API related errors
    #[error("Discord API error: {message}")]
    Discord {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KeyroleError {
    /// Create a backend-unavailable error
    pub fn unavailable(backend: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
        }
    }

    /// Create a backend operation error
    pub fn backend(backend: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: msg.into(),
            source: None,
        }
    }

    /// Create a backend operation error with source
    pub fn backend_with_source(
        backend: impl Into<String>,
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a permission error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    /// Create a deadline error
    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            message: msg.into(),
        }
    }

    /// Create a malformed-state error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedState {
            message: msg.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new Discord API error
    pub fn discord(msg: impl Into<String>) -> Self {
        Self::Discord {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new Discord API error with HTTP status and source
    pub fn discord_with_source(
        msg: impl Into<String>,
        status_code: Option<u16>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Discord {
            message: msg.into(),
            status_code,
            source: Some(Box::new(source)),
        }
    }

    /// Category of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Self::MalformedState { .. } => ErrorKind::MalformedState,
            Self::Config { .. } => ErrorKind::Config,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Discord { .. } => ErrorKind::Discord,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is a permission failure
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self.kind(), ErrorKind::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let unavailable = KeyroleError::unavailable("mongo");
        assert_eq!(unavailable.to_string(), "Storage backend unavailable: mongo");
        assert_eq!(unavailable.kind(), ErrorKind::BackendUnavailable);

        let backend = KeyroleError::backend("postgres", "upsert failed");
        assert!(backend.to_string().contains("postgres"));
        assert!(backend.to_string().contains("upsert failed"));
        assert_eq!(backend.kind(), ErrorKind::Backend);

        let validation = KeyroleError::validation_field("keyword cannot be empty", "keyword");
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert!(validation.to_string().contains("Validation error"));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let wrapped = KeyroleError::backend_with_source("postgres", "connect failed", io_error);

        assert!(wrapped.source().is_some());
        assert_eq!(wrapped.kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_permission_classification() {
        let err = KeyroleError::permission_denied("missing Manage Roles");
        assert!(err.is_permission_denied());
        assert!(!KeyroleError::discord("rate limited").is_permission_denied());
    }

    #[test]
    fn test_conversions_are_internal() {
        let io_error: KeyroleError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io_error.kind(), ErrorKind::Internal);

        let serde_error = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: KeyroleError = serde_error.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("Serialization error"));
    }
}
