// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{comments::CommentService, error::AppError};

/// Removes every comment of a post. Called when the post itself is deleted.
/// Admin only.
pub async fn purge_post_comments(
    State(comments): State<Arc<CommentService>>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let removed = comments.purge_post(post_id).await?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}
