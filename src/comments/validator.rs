// src/comments/validator.rs

use std::collections::HashSet;

use uuid::Uuid;

use super::CommentError;
use crate::store::CommentStore;

/// Extra hops allowed beyond the depth bound before the walk is abandoned.
const GUARD_SLACK: usize = 20;

/// Checks that a reply to `parent_id` may be added to `post_id`.
///
/// Walks the ancestor chain one lookup at a time. The number of hops from
/// the parent to its root equals the parent's depth (root = 1), so the
/// reply is refused once that count reaches `max_depth`: the deepest node
/// a thread can hold sits at `max_depth`.
///
/// A cycle shorter than the bound is caught by the visited set and one
/// longer than it by the depth check, so the iteration cap of
/// `max_depth + 20` is never the check that fires. It stays as a hard
/// stop on the number of store round trips.
pub async fn assert_reply_depth(
    store: &dyn CommentStore,
    post_id: Uuid,
    parent_id: Uuid,
    max_depth: usize,
) -> Result<(), CommentError> {
    let guard = max_depth + GUARD_SLACK;
    let mut visited = HashSet::new();
    let mut current = Some(parent_id);
    let mut depth = 0usize;
    let mut iterations = 0usize;

    while let Some(id) = current {
        iterations += 1;
        if iterations > guard {
            tracing::error!(%post_id, %parent_id, iterations, "ancestor walk exceeded its iteration cap");
            return Err(CommentError::InvalidCommentTree);
        }
        if !visited.insert(id) {
            tracing::warn!(%post_id, %parent_id, comment_id = %id, "comment chain loops back on itself");
            return Err(CommentError::InvalidCommentTree);
        }

        let link = store
            .get_link(id)
            .await?
            .ok_or(CommentError::ParentNotFound)?;

        if link.post_id != post_id {
            return Err(CommentError::CrossPostParent);
        }

        depth += 1;
        if depth >= max_depth {
            return Err(CommentError::DepthExceeded { max: max_depth });
        }

        current = link.parent_id;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{models::comment::Comment, store::MemoryCommentStore};

    const MAX: usize = 10;

    fn comment(id: Uuid, post_id: Uuid, parent_id: Option<Uuid>) -> Comment {
        Comment {
            id,
            post_id,
            author_id: "user-1".to_string(),
            body: "text".to_string(),
            parent_id,
            created_at: Utc::now(),
        }
    }

    /// Inserts a root plus replies so the chain holds `depth` nodes.
    /// Returns the ids, root first.
    async fn chain(store: &MemoryCommentStore, post_id: Uuid, depth: usize) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::with_capacity(depth);
        for _ in 0..depth {
            let id = Uuid::new_v4();
            store
                .insert(&comment(id, post_id, ids.last().copied()))
                .await
                .unwrap();
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn replies_below_the_limit_are_accepted() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let ids = chain(&store, post, MAX - 1).await;

        for parent in &ids {
            assert_reply_depth(&store, post, *parent, MAX).await.unwrap();
        }
    }

    #[tokio::test]
    async fn reply_to_deepest_node_is_refused() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let ids = chain(&store, post, MAX).await;

        let err = assert_reply_depth(&store, post, ids[MAX - 1], MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::DepthExceeded { max: MAX }));

        assert_reply_depth(&store, post, ids[MAX - 2], MAX)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn parent_from_other_post_is_refused() {
        let store = MemoryCommentStore::new();
        let other_post = Uuid::new_v4();
        let ids = chain(&store, other_post, 1).await;

        let err = assert_reply_depth(&store, Uuid::new_v4(), ids[0], MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::CrossPostParent));
    }

    #[tokio::test]
    async fn cross_post_wins_over_depth() {
        let store = MemoryCommentStore::new();
        let other_post = Uuid::new_v4();
        let ids = chain(&store, other_post, MAX).await;

        let err = assert_reply_depth(&store, Uuid::new_v4(), ids[MAX - 1], MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::CrossPostParent));
    }

    #[tokio::test]
    async fn missing_parent_is_reported() {
        let store = MemoryCommentStore::new();
        let err = assert_reply_depth(&store, Uuid::new_v4(), Uuid::new_v4(), MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::ParentNotFound));
    }

    #[tokio::test]
    async fn missing_ancestor_is_reported() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let dangling = Uuid::new_v4();
        store
            .insert(&comment(dangling, post, Some(Uuid::new_v4())))
            .await
            .unwrap();

        let err = assert_reply_depth(&store, post, dangling, MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::ParentNotFound));
    }

    #[tokio::test]
    async fn cycle_in_stored_chain_is_detected() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert(&comment(a, post, Some(b))).await.unwrap();
        store.insert(&comment(b, post, Some(a))).await.unwrap();

        let err = assert_reply_depth(&store, post, a, MAX).await.unwrap_err();
        assert!(matches!(err, CommentError::InvalidCommentTree));
    }

    #[tokio::test]
    async fn self_parented_comment_is_detected() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let a = Uuid::new_v4();
        store.insert(&comment(a, post, Some(a))).await.unwrap();

        let err = assert_reply_depth(&store, post, a, MAX).await.unwrap_err();
        assert!(matches!(err, CommentError::InvalidCommentTree));
    }

    #[tokio::test]
    async fn cycle_longer_than_the_limit_stops_at_the_limit() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            let parent = ids[(i + 1) % ids.len()];
            store.insert(&comment(*id, post, Some(parent))).await.unwrap();
        }

        let err = assert_reply_depth(&store, post, ids[0], 3).await.unwrap_err();
        assert!(matches!(err, CommentError::DepthExceeded { max: 3 }));
    }

    #[tokio::test]
    async fn depth_one_allows_only_roots() {
        let store = MemoryCommentStore::new();
        let post = Uuid::new_v4();
        let ids = chain(&store, post, 1).await;

        let err = assert_reply_depth(&store, post, ids[0], 1).await.unwrap_err();
        assert!(matches!(err, CommentError::DepthExceeded { max: 1 }));
    }
}
