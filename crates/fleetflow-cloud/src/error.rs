//! Cloud provider error types

use std::time::Duration;
use thiserror::Error;

/// Machine-readable error class reported by a remote control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The addressed object does not exist
    NotFound,
    /// The request was rejected for one of its parameters
    /// (e.g. an ID that does not belong to the queried zone)
    ParamError,
    Unauthorized,
    Forbidden,
    Conflict,
    RateLimited,
    Server,
    /// Any other status code
    Other(u16),
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::NotFound => write!(f, "not-found"),
            ApiErrorKind::ParamError => write!(f, "parameter-error"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Forbidden => write!(f, "forbidden"),
            ApiErrorKind::Conflict => write!(f, "conflict"),
            ApiErrorKind::RateLimited => write!(f, "rate-limited"),
            ApiErrorKind::Server => write!(f, "server-error"),
            ApiErrorKind::Other(code) => write!(f, "http-{}", code),
        }
    }
}

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("found multiple {kind}s named {name:?}, please specify a unique ID instead")]
    Ambiguous { kind: String, name: String },

    #[error("API error ({kind}): {message}")]
    Api { kind: ApiErrorKind, message: String },

    #[error("Timeout: {operation} did not finish within {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn api(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        CloudError::Api {
            kind,
            message: message.into(),
        }
    }

    /// Whether the remote object is absent, either detected locally or
    /// reported by the API.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CloudError::NotFound(_)
                | CloudError::Api {
                    kind: ApiErrorKind::NotFound,
                    ..
                }
        )
    }

    pub fn is_param_error(&self) -> bool {
        matches!(
            self,
            CloudError::Api {
                kind: ApiErrorKind::ParamError,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
