use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    comments::{CommentService, CreateComment},
    error::AppError,
    models::comment::{CommentListParams, CreateCommentRequest, UpdateCommentRequest},
    utils::jwt::Claims,
};

const DEFAULT_LIST_LIMIT: i64 = 200;
const MAX_LIST_LIMIT: i64 = 1000;

/// Create a comment or a reply on a post.
/// Requires: Login.
pub async fn create_comment(
    State(comments): State<Arc<CommentService>>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let id = comments
        .create_comment(CreateComment {
            post_id,
            author_id: claims.sub,
            body: payload.body,
            parent_id: payload.parent_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// List the comments of a post as reply trees.
pub async fn list_comments(
    State(comments): State<Arc<CommentService>>,
    Path(post_id): Path<Uuid>,
    Query(params): Query<CommentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let thread = comments.thread(post_id, limit).await?;
    Ok(Json(thread))
}

/// Get a single comment by ID.
pub async fn get_comment(
    State(comments): State<Arc<CommentService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments.get_comment(id).await?;
    Ok(Json(comment))
}

/// Edit the body of a comment.
/// Requires: Login + (Author OR Admin).
pub async fn update_comment(
    State(comments): State<Arc<CommentService>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let comment = comments
        .update_comment(id, &claims.actor(), &payload.body)
        .await?;
    Ok(Json(comment))
}

/// Delete a comment together with its replies.
/// Requires: Login + (Author OR Admin).
pub async fn delete_comment(
    State(comments): State<Arc<CommentService>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    comments.delete_comment(id, &claims.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Comment policy the UI mirrors (reply affordance, reply support).
pub async fn comment_settings(
    State(comments): State<Arc<CommentService>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "max_comment_depth": comments.max_depth(),
        "replies_enabled": comments.supports_replies(),
    }))
}
