// src/store/memory.rs

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CommentStore, StoreError, StoreResult};
use crate::models::comment::{Comment, CommentLink};

/// Process-local comment table, used when no database is configured and in tests.
///
/// Rows are kept in insertion order. Like the database adapters it does
/// not check that a parent exists; that is the validator's job.
#[derive(Debug)]
pub struct MemoryCommentStore {
    rows: RwLock<Vec<Comment>>,
    parent_link: bool,
}

impl Default for MemoryCommentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            parent_link: true,
        }
    }

    /// Behaves like a table that predates reply links.
    pub fn without_parent_link() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            parent_link: false,
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn shaped(&self, comment: &Comment) -> Comment {
        let mut comment = comment.clone();
        if !self.parent_link {
            comment.parent_id = None;
        }
        comment
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn insert(&self, comment: &Comment) -> StoreResult<()> {
        if !self.parent_link && comment.parent_id.is_some() {
            return Err(StoreError::SchemaIncompatible(
                "reply links (no parent_id column)".to_string(),
            ));
        }
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id == comment.id) {
            return Err(StoreError::UnexpectedRowCount(0));
        }
        rows.push(comment.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id == id).map(|row| self.shaped(row)))
    }

    async fn get_link(&self, id: Uuid) -> StoreResult<Option<CommentLink>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| CommentLink::from(&self.shaped(row))))
    }

    async fn list_by_post(&self, post_id: Uuid, limit: i64) -> StoreResult<Vec<Comment>> {
        let rows = self.rows.read().await;
        let mut comments: Vec<Comment> = rows
            .iter()
            .filter(|row| row.post_id == post_id)
            .map(|row| self.shaped(row))
            .collect();
        // Stable: equal timestamps keep insertion order.
        comments.sort_by_key(|c| c.created_at);
        comments.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(comments)
    }

    async fn update_body(&self, id: Uuid, body: &str) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.body = body.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        let mut rows = self.rows.write().await;
        if !rows.iter().any(|row| row.id == id) {
            return Ok(0);
        }
        let mut doomed = HashSet::from([id]);
        if self.parent_link {
            // Grow the subtree until no further replies are found.
            loop {
                let before = doomed.len();
                for row in rows.iter() {
                    if row.parent_id.is_some_and(|p| doomed.contains(&p)) {
                        doomed.insert(row.id);
                    }
                }
                if doomed.len() == before {
                    break;
                }
            }
        }
        let before = rows.len();
        rows.retain(|row| !doomed.contains(&row.id));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_by_post(&self, post_id: Uuid) -> StoreResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.post_id != post_id);
        Ok((before - rows.len()) as u64)
    }

    fn supports_parent_link(&self) -> bool {
        self.parent_link
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn comment(post_id: Uuid, parent_id: Option<Uuid>, minute: i64) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id: "user-1".to_string(),
            body: "hello".to_string(),
            parent_id,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    #[tokio::test]
    async fn list_orders_by_creation_and_respects_limit() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let late = comment(post, None, 5);
        let early = comment(post, None, 1);
        let other_post = comment(Uuid::new_v4(), None, 0);
        store.insert(&late).await.unwrap();
        store.insert(&early).await.unwrap();
        store.insert(&other_post).await.unwrap();

        let listed = store.list_by_post(post, 10).await.unwrap();
        assert_eq!(listed, vec![early.clone(), late]);

        let limited = store.list_by_post(post, 1).await.unwrap();
        assert_eq!(limited, vec![early]);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = MemoryCommentStore::new();
        let c = comment(Uuid::new_v4(), None, 0);
        store.insert(&c).await.unwrap();
        assert!(store.insert(&c).await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn delete_removes_replies() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let root = comment(post, None, 0);
        let reply = comment(post, Some(root.id), 1);
        let nested = comment(post, Some(reply.id), 2);
        let sibling = comment(post, None, 3);
        for c in [&root, &reply, &nested, &sibling] {
            store.insert(c).await.unwrap();
        }

        assert_eq!(store.delete(root.id).await.unwrap(), 3);
        assert_eq!(store.list_by_post(post, 10).await.unwrap(), vec![sibling]);
        assert_eq!(store.delete(root.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn flat_store_rejects_replies_and_reads_flat() {
        let store = MemoryCommentStore::without_parent_link();
        let post = Uuid::new_v4();
        let root = comment(post, None, 0);
        store.insert(&root).await.unwrap();

        let reply = comment(post, Some(root.id), 1);
        let err = store.insert(&reply).await.unwrap_err();
        assert!(matches!(err, StoreError::SchemaIncompatible(_)));
        assert_eq!(store.len().await, 1);

        let link = store.get_link(root.id).await.unwrap().unwrap();
        assert_eq!(link.parent_id, None);
        assert!(!store.supports_parent_link());
    }

    #[tokio::test]
    async fn update_body_reports_missing_rows() {
        let store = MemoryCommentStore::new();
        let c = comment(Uuid::new_v4(), None, 0);
        store.insert(&c).await.unwrap();

        assert!(store.update_body(c.id, "edited").await.unwrap());
        assert!(!store.update_body(Uuid::new_v4(), "edited").await.unwrap());
        assert_eq!(store.get_by_id(c.id).await.unwrap().unwrap().body, "edited");
    }
}
