use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use acutis_core::error::FormError;
use acutis_intake::IntakeError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// A lifecycle rule refused the request. `fields` carries the current
    /// step's validation messages when that is why.
    InvalidTransition {
        message: String,
        fields: Option<BTreeMap<String, String>>,
    },
    Conflict(String),
    Unauthorized(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, fields) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation", msg, None),
            ApiError::InvalidTransition { message, fields } => {
                let status = if fields.is_some() {
                    StatusCode::UNPROCESSABLE_ENTITY
                } else {
                    StatusCode::CONFLICT
                };
                (status, "invalid_transition", message, fields)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                kind,
                fields,
            }),
        )
            .into_response()
    }
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        let message = e.to_string();
        match e {
            FormError::NotFound { .. } => ApiError::NotFound(message),
            FormError::Validation(_) => ApiError::BadRequest(message),
            FormError::InvalidTransition(_) => ApiError::InvalidTransition {
                message,
                fields: None,
            },
            FormError::Conflict(_) => ApiError::Conflict(message),
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::Form(e) => e.into(),
            IntakeError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}
