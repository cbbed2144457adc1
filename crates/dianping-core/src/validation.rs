//! Validation utilities.

use crate::{DianpingError, FieldError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `DianpingError` on failure.
    fn validate_request(&self) -> Result<(), DianpingError> {
        self.validate().map_err(validation_errors_to_dianping_error)
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to `DianpingError`.
#[must_use]
pub fn validation_errors_to_dianping_error(errors: ValidationErrors) -> DianpingError {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect();
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));

    let message = field_errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    DianpingError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(required(message = "shop id cannot be empty"))]
        id: Option<i64>,
        #[validate(length(max = 4))]
        name: String,
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_validate_request_collects_messages() {
        let probe = Probe {
            id: None,
            name: "too long".to_string(),
        };
        let err = probe.validate_request().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("id: shop id cannot be empty"));
        assert!(message.contains("name: length"));
    }

    #[test]
    fn test_validate_request_ok() {
        let probe = Probe {
            id: Some(1),
            name: "ok".to_string(),
        };
        assert!(probe.validate_request().is_ok());
    }
}
