//! # JSON response envelope
//!
//! Every non-redirect response is `{success, data | error, timestamp}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::registration::ValidationErrors;
use crate::{lerror, logging::{LogComponent, LogStage}};

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    SuccessWithMessage(T, String),
    Error(AppError),
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success(data) => (
                StatusCode::OK,
                Json(SuccessResponse {
                    success: true,
                    data: Some(data),
                    message: None,
                    timestamp: Utc::now(),
                }),
            )
                .into_response(),
            Self::SuccessWithMessage(data, message) => (
                StatusCode::OK,
                Json(SuccessResponse {
                    success: true,
                    data: Some(data),
                    message: Some(message),
                    timestamp: Utc::now(),
                }),
            )
                .into_response(),
            Self::Error(error) => error.into_response(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();

        // Server-side failures are logged in full and reported generically.
        let message = if status.is_server_error() {
            lerror!(
                "system",
                LogStage::Error,
                LogComponent::ServerSetup,
                "error_response",
                &format!("request failed: {self:?}"),
                code = code
            );
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let fields = match self.root() {
            Self::Validation { errors } => Some(errors.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorInfo {
                code: code.to_string(),
                message,
                fields,
            },
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

pub fn success_with_message<T: Serialize>(data: T, message: &str) -> Response {
    ApiResponse::SuccessWithMessage(data, message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_carries_fields() {
        let mut errors = ValidationErrors::default();
        errors.add("username", "This username is already in use.");

        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"]["username"][0], "This username is already in use.");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::internal("secret detail").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "internal server error");
        assert!(body["error"].get("fields").is_none());
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let body = body_json(success(serde_json::json!({"pong": true}))).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["pong"], true);
        assert!(body.get("message").is_none());
    }
}
