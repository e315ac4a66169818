// src/comments/assembly.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::comment::{Comment, CommentNode};

/// Rebuilds the reply forest of a post from its flat, oldest-first comment list.
///
/// Siblings keep their input order. A comment whose parent is not in the
/// list is left out: it is neither a root nor reachable from one.
pub fn build_forest(comments: Vec<Comment>, max_depth: usize) -> Vec<CommentNode> {
    let mut roots = Vec::new();
    let mut children: HashMap<Uuid, Vec<Comment>> = HashMap::new();

    for comment in comments {
        match comment.parent_id {
            None => roots.push(comment),
            Some(parent_id) => children.entry(parent_id).or_default().push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| build_node(root, 1, max_depth, &mut children))
        .collect()
}

fn build_node(
    comment: Comment,
    depth: usize,
    max_depth: usize,
    children: &mut HashMap<Uuid, Vec<Comment>>,
) -> CommentNode {
    // Taking the bucket means each comment is placed at most once.
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| build_node(child, depth + 1, max_depth, children))
        .collect();

    CommentNode {
        comment,
        depth,
        can_reply: depth < max_depth,
        replies,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn comment(id: u128, parent: Option<u128>, minute: i64) -> Comment {
        Comment {
            id: Uuid::from_u128(id),
            post_id: Uuid::from_u128(999),
            author_id: "user-1".to_string(),
            body: format!("comment {id}"),
            parent_id: parent.map(Uuid::from_u128),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<u128> {
        nodes.iter().map(|n| n.comment.id.as_u128()).collect()
    }

    #[test]
    fn nests_replies_under_their_parents() {
        // A(1) root, B(2) root, C(3) -> A, D(4) -> C
        let forest = build_forest(
            vec![
                comment(1, None, 0),
                comment(2, None, 1),
                comment(3, Some(1), 2),
                comment(4, Some(3), 3),
            ],
            10,
        );

        assert_eq!(ids(&forest), vec![1, 2]);
        assert_eq!(ids(&forest[0].replies), vec![3]);
        assert_eq!(ids(&forest[0].replies[0].replies), vec![4]);
        assert!(forest[1].replies.is_empty());
        assert_eq!(forest[0].replies[0].replies[0].depth, 3);
    }

    #[test]
    fn siblings_keep_input_order() {
        let forest = build_forest(
            vec![
                comment(1, None, 0),
                comment(5, Some(1), 1),
                comment(3, Some(1), 2),
                comment(4, Some(1), 3),
            ],
            10,
        );
        assert_eq!(ids(&forest[0].replies), vec![5, 3, 4]);
    }

    #[test]
    fn nodes_at_the_limit_cannot_be_replied_to() {
        let mut list = vec![comment(1, None, 0)];
        for id in 2..=4u128 {
            list.push(comment(id, Some(id - 1), id as i64));
        }
        let forest = build_forest(list, 3);

        let mut node = &forest[0];
        let mut seen = Vec::new();
        loop {
            seen.push((node.depth, node.can_reply));
            match node.replies.first() {
                Some(next) => node = next,
                None => break,
            }
        }
        // Depth 4 only exists through bad data; it is still rendered.
        assert_eq!(seen, vec![(1, true), (2, true), (3, false), (4, false)]);
    }

    #[test]
    fn orphans_are_left_out() {
        let forest = build_forest(
            vec![comment(1, None, 0), comment(2, Some(42), 1), comment(3, Some(2), 2)],
            10,
        );
        assert_eq!(ids(&forest), vec![1]);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn flat_list_is_all_roots() {
        let forest = build_forest(vec![comment(1, None, 0), comment(2, None, 1)], 10);
        assert_eq!(ids(&forest), vec![1, 2]);
        assert!(forest.iter().all(|n| n.depth == 1 && n.can_reply));
    }

    #[test]
    fn empty_list_yields_empty_forest() {
        assert!(build_forest(Vec::new(), 10).is_empty());
    }
}
