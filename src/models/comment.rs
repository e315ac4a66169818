use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single comment as every store adapter returns it.
///
/// `parent_id` is always `None` when the backing table has no parent link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: String,
    pub body: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// The part of a comment needed to walk an ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentLink {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
}

impl From<&Comment> for CommentLink {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
        }
    }
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Comment must be between 1 and 5000 characters"
    ))]
    pub body: String,

    /// Optional: the ID of the comment being replied to.
    /// Kept as a string so a malformed id is reported as a validation error.
    pub parent_id: Option<String>,
}

/// DTO for editing the body of an existing comment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Comment must be between 1 and 5000 characters"
    ))]
    pub body: String,
}

/// Query parameters for listing the comments of a post.
#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    /// Number of comments to fetch (default: 200, max: 1000).
    pub limit: Option<i64>,
}

/// One node of an assembled reply tree.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    /// Root comments have depth 1.
    pub depth: usize,
    /// UI helper: false once the node sits at the nesting limit.
    pub can_reply: bool,
    pub replies: Vec<CommentNode>,
}

/// All reply trees of a post.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    pub post_id: Uuid,
    /// Number of rows fetched, including any that could not be placed.
    pub total: usize,
    pub max_depth: usize,
    pub comments: Vec<CommentNode>,
}
