// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::comments::CommentError;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Maps core comment failures onto HTTP outcomes.
///
/// Integrity failures share one generic message; a well-behaved client
/// never triggers them. Schema problems need an operator, not a retry.
impl From<CommentError> for AppError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::ValidationFailed(msg) => AppError::BadRequest(msg),
            CommentError::DepthExceeded { .. } => {
                AppError::BadRequest("Reply nesting limit reached".to_string())
            }
            CommentError::ParentNotFound
            | CommentError::CrossPostParent
            | CommentError::InvalidCommentTree => {
                tracing::warn!("Rejected reply: {}", err);
                AppError::BadRequest("Invalid parent comment".to_string())
            }
            CommentError::NotFound => AppError::NotFound("Comment not found".to_string()),
            CommentError::Forbidden => {
                AppError::Forbidden("You are not allowed to modify this comment".to_string())
            }
            CommentError::SchemaIncompatible(_) | CommentError::Store(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}
