//! Exoscale provider error types

use fleetflow_cloud::{ApiErrorKind, CloudError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExoscaleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExoscaleError>;

/// Classifies an API failure, preferring the machine-readable code over the
/// HTTP status
pub fn classify(status: u16, code: &str) -> ApiErrorKind {
    match code {
        "not-found" => return ApiErrorKind::NotFound,
        "parameter-error" | "invalid-request" => return ApiErrorKind::ParamError,
        "unauthorized" => return ApiErrorKind::Unauthorized,
        "forbidden" => return ApiErrorKind::Forbidden,
        "conflict" => return ApiErrorKind::Conflict,
        "too-many-requests" => return ApiErrorKind::RateLimited,
        "server-error" => return ApiErrorKind::Server,
        _ => {}
    }

    match status {
        400 => ApiErrorKind::ParamError,
        401 => ApiErrorKind::Unauthorized,
        403 => ApiErrorKind::Forbidden,
        404 => ApiErrorKind::NotFound,
        409 => ApiErrorKind::Conflict,
        429 => ApiErrorKind::RateLimited,
        500..=599 => ApiErrorKind::Server,
        other => ApiErrorKind::Other(other),
    }
}

impl From<ExoscaleError> for CloudError {
    fn from(err: ExoscaleError) -> Self {
        match err {
            ExoscaleError::Api {
                status,
                code,
                message,
            } => CloudError::Api {
                kind: classify(status, &code),
                message,
            },
            ExoscaleError::Http(e) => {
                let kind = e
                    .status()
                    .map(|s| classify(s.as_u16(), ""))
                    .unwrap_or(ApiErrorKind::Other(0));
                CloudError::Api {
                    kind,
                    message: e.to_string(),
                }
            }
            ExoscaleError::MissingEnvVar(var) => {
                CloudError::InvalidConfig(format!("missing environment variable {}", var))
            }
            ExoscaleError::InvalidConfig(msg) => CloudError::InvalidConfig(msg),
            ExoscaleError::Json(e) => CloudError::Json(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: &str) -> CloudError {
        ExoscaleError::Api {
            status,
            code: code.to_string(),
            message: "boom".to_string(),
        }
        .into()
    }

    #[test]
    fn test_code_wins_over_status() {
        assert!(api(400, "not-found").is_not_found());
        assert!(api(404, "parameter-error").is_param_error());
    }

    #[test]
    fn test_status_fallback() {
        assert!(api(404, "").is_not_found());
        assert!(api(400, "").is_param_error());
        assert!(matches!(
            api(503, ""),
            CloudError::Api {
                kind: ApiErrorKind::Server,
                ..
            }
        ));
        assert!(matches!(
            api(418, "teapot"),
            CloudError::Api {
                kind: ApiErrorKind::Other(418),
                ..
            }
        ));
    }

    #[test]
    fn test_config_errors() {
        let err: CloudError = ExoscaleError::MissingEnvVar("EXOSCALE_API_KEY".into()).into();
        assert!(matches!(err, CloudError::InvalidConfig(_)));
    }
}
