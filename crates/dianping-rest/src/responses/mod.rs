//! API response types.
//!
//! Every endpoint answers with `{ "success": bool, "data"?: T, "errorMsg"?: string }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dianping_core::DianpingError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(rename = "errorMsg", skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_msg: None,
        }
    }
}

impl ApiResponse<()> {
    /// Creates a successful response without a payload.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error_msg: None,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_msg: Some(message.into()),
        }
    }
}

/// Application error type for Axum.
#[derive(Debug)]
pub struct AppError(pub DianpingError);

impl From<DianpingError> for AppError {
    fn from(err: DianpingError) -> Self {
        Self(err)
    }
}

impl AppError {
    /// Message shown to API clients.
    ///
    /// Infrastructure details stay in the logs.
    #[must_use]
    pub fn client_message(&self) -> String {
        match &self.0 {
            DianpingError::NotFound { resource_type, .. } => format!("{} not found", resource_type),
            DianpingError::Validation(msg)
            | DianpingError::BusinessRule(msg)
            | DianpingError::Unauthorized(msg) => msg.clone(),
            DianpingError::LockTimeout { .. } => "Service busy, please retry".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        }

        let body = Json(ApiResponse::error(self.client_message()));
        (status, body).into_response()
    }
}

/// Result type for Axum handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Helper to create a success response.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Helper to create a success response without a payload.
pub fn ok_empty() -> ApiResult<()> {
    Ok(Json(ApiResponse::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_omits_error() {
        let json = serde_json::to_value(ApiResponse::success(7)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 7}));
    }

    #[test]
    fn test_error_uses_error_msg_field() {
        let json = serde_json::to_value(ApiResponse::error("Shop not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "errorMsg": "Shop not found"})
        );
    }

    #[test]
    fn test_client_messages() {
        let not_found = AppError(DianpingError::not_found("Shop", 999));
        assert_eq!(not_found.client_message(), "Shop not found");

        let validation = AppError(DianpingError::validation("shop id cannot be empty"));
        assert_eq!(validation.client_message(), "shop id cannot be empty");

        let cache = AppError(DianpingError::cache("connection refused"));
        assert_eq!(cache.client_message(), "Internal server error");
    }
}
