//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all layers of Dianping.
///
/// Domain, infrastructure and presentation failures all funnel into this
/// enum so the REST layer can map them to a status code in one place.
#[derive(Error, Debug)]
pub enum DianpingError {
    // ============ Domain Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ============ Session Errors ============
    /// No logged-in user on the request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ============ Infrastructure Errors ============
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Redis/Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// A rebuild lock could not be acquired within the retry budget
    #[error("Lock busy: {key} still held after {attempts} attempts")]
    LockTimeout { key: String, attempts: u32 },

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DianpingError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) | Self::BusinessRule(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::LockTimeout { .. } => 503,
            Self::Database(_)
            | Self::Configuration(_)
            | Self::Cache(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a business rule error.
    #[must_use]
    pub fn business_rule<T: Into<String>>(message: T) -> Self {
        Self::BusinessRule(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a cache error.
    #[must_use]
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache(message.into())
    }

    /// Returns true when the error came from the cache layer rather than from
    /// the authoritative store or the request itself.
    #[must_use]
    pub const fn is_cache_failure(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for DianpingError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for DianpingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(DianpingError::not_found("Shop", 999).status_code(), 404);
        assert_eq!(DianpingError::validation("shop id cannot be empty").status_code(), 400);
        assert_eq!(DianpingError::unauthorized("not logged in").status_code(), 401);
        assert_eq!(DianpingError::Database("db error".to_string()).status_code(), 500);
        assert_eq!(DianpingError::cache("pool closed").status_code(), 500);
        assert_eq!(
            DianpingError::LockTimeout {
                key: "shop:lock:14".to_string(),
                attempts: 200
            }
            .status_code(),
            503
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(DianpingError::not_found("Shop", 1).error_code(), "NOT_FOUND");
        assert_eq!(DianpingError::validation("bad").error_code(), "VALIDATION_ERROR");
        assert_eq!(DianpingError::business_rule("empty").error_code(), "BUSINESS_RULE_VIOLATION");
        assert_eq!(DianpingError::cache("down").error_code(), "CACHE_ERROR");
        assert_eq!(DianpingError::Internal("err".to_string()).error_code(), "INTERNAL_ERROR");
        assert_eq!(
            DianpingError::LockTimeout {
                key: "k".to_string(),
                attempts: 1
            }
            .error_code(),
            "LOCK_TIMEOUT"
        );
    }

    #[test]
    fn test_cache_failure_classification() {
        assert!(DianpingError::cache("refused").is_cache_failure());
        assert!(!DianpingError::Database("refused".to_string()).is_cache_failure());
    }

    #[test]
    fn test_lock_timeout_display() {
        let err = DianpingError::LockTimeout {
            key: "shop:lock:14".to_string(),
            attempts: 3,
        };
        let message = err.to_string();
        assert!(message.contains("shop:lock:14"));
        assert!(message.contains('3'));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DianpingError = json_err.into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
