use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::admin::validation::FieldError;
use crate::api_client::ApiError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid payload ({} field errors)", .0.len())]
    InvalidPayload(Vec<FieldError>),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Upstream error: {0}")]
    Upstream(#[from] ApiError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;

        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::InvalidPayload(errors) => {
                let message = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                fields = Some(errors);
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Upstream(e) => upstream_parts(e),
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(fields) = fields {
            error["fields"] = json!(fields);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

fn upstream_parts(e: ApiError) -> (StatusCode, &'static str, String) {
    match e {
        ApiError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Session expired, please log in again".to_string(),
        ),
        ApiError::NotFound(path) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{path} not found"),
        ),
        ApiError::Rejected { message } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "REJECTED", message)
        }
        ApiError::Api { status, message } if (400..500).contains(&status) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
            "UPSTREAM_REJECTED",
            message,
        ),
        other => {
            tracing::error!("Upstream error: {other}");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "The data service is unavailable".to_string(),
            )
        }
    }
}
