// src/store/mod.rs

//! Comment Store Gateway.
//!
//! One logical interface over the physical layouts the `comments` table
//! has gone through. The layout is chosen once (configuration or a startup
//! probe) and a matching adapter is built; callers never see which one
//! served a request.

pub mod memory;
pub mod postgres;
pub mod probe;

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::comment::{Comment, CommentLink};

pub use memory::MemoryCommentStore;
pub use postgres::{FlatCommentStore, ThreadedCommentStore, build_store};
pub use probe::probe_schema;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("comments table does not exist")]
    MissingTable,
    #[error("store schema does not support {0}")]
    SchemaIncompatible(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("expected exactly one affected row, got {0}")]
    UnexpectedRowCount(u64),
}

const UNDEFINED_TABLE: &str = "42P01";
const UNDEFINED_COLUMN: &str = "42703";

impl From<sqlx::Error> for StoreError {
    /// Classifies by SQLSTATE so schema drift is never confused with an
    /// ordinary failure.
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());
        match code.as_deref() {
            Some(UNDEFINED_TABLE) => StoreError::MissingTable,
            Some(UNDEFINED_COLUMN) => StoreError::SchemaIncompatible(err.to_string()),
            _ => StoreError::Database(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Name of the primary-key column of the comments table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    /// Current layout.
    Id,
    /// Layout before the threaded-replies migration.
    CommentId,
}

impl KeyColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyColumn::Id => "id",
            KeyColumn::CommentId => "comment_id",
        }
    }
}

impl fmt::Display for KeyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(KeyColumn::Id),
            "comment_id" => Ok(KeyColumn::CommentId),
            other => Err(format!("unknown key column '{other}'")),
        }
    }
}

/// Physical layout of the comments table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaShape {
    pub key: KeyColumn,
    pub parent_link: bool,
}

impl SchemaShape {
    pub const CURRENT: SchemaShape = SchemaShape {
        key: KeyColumn::Id,
        parent_link: true,
    };

    pub const LEGACY: SchemaShape = SchemaShape {
        key: KeyColumn::CommentId,
        parent_link: false,
    };
}

impl fmt::Display for SchemaShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = if self.parent_link { "threaded" } else { "flat" };
        write!(f, "{link} (key column '{}')", self.key)
    }
}

/// Logical operations on the comment table.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Persists one comment. Exactly one row is written on success.
    async fn insert(&self, comment: &Comment) -> StoreResult<()>;

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>>;

    async fn get_link(&self, id: Uuid) -> StoreResult<Option<CommentLink>>;

    /// Comments of a post, oldest first.
    async fn list_by_post(&self, post_id: Uuid, limit: i64) -> StoreResult<Vec<Comment>>;

    /// Returns false when no comment has this id.
    async fn update_body(&self, id: Uuid, body: &str) -> StoreResult<bool>;

    /// Deletes a comment together with its replies. Returns the number of rows removed.
    async fn delete(&self, id: Uuid) -> StoreResult<u64>;

    async fn delete_by_post(&self, post_id: Uuid) -> StoreResult<u64>;

    /// Whether replies can be stored at all.
    fn supports_parent_link(&self) -> bool;
}
