//! Error types for the synthesis service client
//!
//! Every remote call either returns a well-formed value or exactly one
//! `ClientError` variant. HTTP status codes are folded into variants by
//! [`ClientError::from_status`].

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Client-level error types
///
/// Non-terminal polling states are never reported through this enum;
/// they are returned as regular status values.
#[derive(Error, Debug)]
pub enum ClientError {
    /// API key missing, malformed or rejected by the service
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Project, prediction, sequence, synthesis, execution or report is unknown
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload failed remote schema or business rules
    #[error("Validation failed: {0}")]
    Validation(ValidationFailure),

    /// Caller-supplied input was rejected before or by the service
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request cadence exceeded the service's rate limit
    #[error("Rate limited by the service (retry after {retry_after:?}s): {message}")]
    RateLimited {
        /// Seconds from the `Retry-After` header, when the service sent one
        retry_after: Option<u64>,
        /// Response body
        message: String,
    },

    /// Operation is invalid for the current remote-side state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transport failure, 5xx or malformed response
    #[error("Service error{}: {message}", http_suffix(.status))]
    Service {
        /// HTTP status, absent for transport or decoding failures
        status: Option<u16>,
        /// Human-readable detail
        message: String,
    },

    /// Local file operation failed (e.g. while saving a report)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn http_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" (HTTP {})", s))
        .unwrap_or_default()
}

impl ClientError {
    /// Map a non-2xx HTTP response to an error variant
    ///
    /// # Arguments
    /// * `status` - HTTP status code
    /// * `body` - Raw response body (used for messages and validation details)
    /// * `retry_after` - Parsed `Retry-After` header, if any
    pub fn from_status(status: u16, body: &str, retry_after: Option<u64>) -> Self {
        let message = ErrorBody::message_from(body);
        match status {
            401 | 403 => ClientError::Authentication(message),
            404 => ClientError::NotFound(message),
            400 | 422 => ClientError::Validation(ValidationFailure::from_body(body)),
            409 => ClientError::Conflict(message),
            429 => ClientError::RateLimited {
                retry_after,
                message,
            },
            _ => ClientError::Service {
                status: Some(status),
                message,
            },
        }
    }

    /// Build a `Service` error for failures that never produced a status
    pub fn service(message: impl Into<String>) -> Self {
        ClientError::Service {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the caller may reasonably retry after backing off
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::RateLimited { .. } => true,
            ClientError::Service {
                status: Some(s), ..
            } => *s >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Service {
            status: err.status().map(|s| s.as_u16()),
            message: format!("HTTP request failed: {}", err),
        }
    }
}

/// Details of a rejected payload
///
/// `violations` lists the offending actions when the service reported them,
/// so the caller can correct the list and resubmit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationFailure {
    /// Top-level message from the service
    pub message: String,
    /// Per-action violations, in the order the service reported them
    pub violations: Vec<ActionViolation>,
}

/// One offending action within a submitted list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionViolation {
    /// Position of the action in the submitted list
    #[serde(default)]
    pub action_index: Option<usize>,
    /// Action kind name as the service knows it
    #[serde(default, alias = "actionName")]
    pub action_kind: Option<String>,
    /// Why the action was rejected
    #[serde(default)]
    pub message: String,
}

impl ValidationFailure {
    fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self {
                message: parsed.text().unwrap_or_else(|| body.to_string()),
                violations: parsed.errors,
            },
            Err(_) => Self {
                message: body.to_string(),
                violations: Vec::new(),
            },
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for violation in &self.violations {
            write!(f, "; ")?;
            if let Some(index) = violation.action_index {
                write!(f, "action #{}", index)?;
            } else {
                write!(f, "action")?;
            }
            if let Some(kind) = &violation.action_kind {
                write!(f, " ({})", kind)?;
            }
            write!(f, ": {}", violation.message)?;
        }
        Ok(())
    }
}

/// Error body shape returned by the service
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Vec<ActionViolation>,
}

impl ErrorBody {
    fn text(&self) -> Option<String> {
        self.message.clone().or_else(|| self.error.clone())
    }

    fn message_from(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.text())
            .unwrap_or_else(|| body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ClientError::from_status(401, "", None),
            ClientError::Authentication(_)
        ));
        assert!(matches!(
            ClientError::from_status(403, "", None),
            ClientError::Authentication(_)
        ));
        assert!(matches!(
            ClientError::from_status(404, "", None),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(409, "", None),
            ClientError::Conflict(_)
        ));
        assert!(matches!(
            ClientError::from_status(422, "{}", None),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from_status(503, "down", None),
            ClientError::Service {
                status: Some(503),
                ..
            }
        ));
    }

    #[test]
    fn test_rate_limit_keeps_retry_after() {
        match ClientError::from_status(429, r#"{"message":"slow down"}"#, Some(12)) {
            ClientError::RateLimited {
                retry_after,
                message,
            } => {
                assert_eq!(retry_after, Some(12));
                assert_eq!(message, "slow down");
            }
            other => panic!("Expected RateLimited, got: {:?}", other),
        }
    }

    #[test]
    fn test_validation_body_with_violations() {
        let body = r#"{
            "message": "Invalid actions",
            "errors": [
                {"actionIndex": 2, "actionName": "drysolution", "message": "duration is required"}
            ]
        }"#;
        match ClientError::from_status(400, body, None) {
            ClientError::Validation(failure) => {
                assert_eq!(failure.message, "Invalid actions");
                assert_eq!(failure.violations.len(), 1);
                assert_eq!(failure.violations[0].action_index, Some(2));
                assert_eq!(
                    failure.violations[0].action_kind.as_deref(),
                    Some("drysolution")
                );
                let text = failure.to_string();
                assert!(text.contains("action #2 (drysolution)"));
            }
            other => panic!("Expected Validation, got: {:?}", other),
        }
    }

    #[test]
    fn test_validation_body_not_json() {
        match ClientError::from_status(400, "bad request", None) {
            ClientError::Validation(failure) => {
                assert_eq!(failure.message, "bad request");
                assert!(failure.violations.is_empty());
            }
            other => panic!("Expected Validation, got: {:?}", other),
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(ClientError::from_status(429, "", None).is_retryable());
        assert!(ClientError::from_status(502, "", None).is_retryable());
        assert!(!ClientError::from_status(404, "", None).is_retryable());
        assert!(!ClientError::service("decode").is_retryable());
    }

    #[test]
    fn test_service_display_includes_status() {
        let err = ClientError::from_status(500, "boom", None);
        assert_eq!(err.to_string(), "Service error (HTTP 500): boom");
        assert_eq!(
            ClientError::service("timeout").to_string(),
            "Service error: timeout"
        );
    }
}
