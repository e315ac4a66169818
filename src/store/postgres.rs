// src/store/postgres.rs

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::{CommentStore, KeyColumn, SchemaShape, StoreError, StoreResult, probe_schema};
use crate::models::comment::{Comment, CommentLink};

/// Builds the adapter matching a probed or configured layout.
pub fn build_store(pool: PgPool, shape: SchemaShape) -> Arc<dyn CommentStore> {
    if shape.parent_link {
        Arc::new(ThreadedCommentStore::new(pool, shape.key))
    } else {
        Arc::new(FlatCommentStore::new(pool, shape.key))
    }
}

/// SQL for one layout. Every SELECT aliases the key column to `id` and
/// always yields a `parent_id` column, so rows map the same way for all
/// layouts.
#[derive(Debug, Clone)]
struct Queries {
    insert: String,
    get_by_id: String,
    get_link: String,
    list_by_post: String,
    update_body: String,
    delete: String,
    delete_by_post: String,
}

impl Queries {
    fn new(shape: SchemaShape) -> Self {
        let key = shape.key.as_str();
        let parent = if shape.parent_link {
            "parent_id"
        } else {
            "NULL::uuid AS parent_id"
        };
        let columns = format!("{key} AS id, post_id, author_id, body, {parent}, created_at");

        let insert = if shape.parent_link {
            format!(
                "INSERT INTO comments ({key}, post_id, author_id, body, parent_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)"
            )
        } else {
            format!(
                "INSERT INTO comments ({key}, post_id, author_id, body, created_at) \
                 VALUES ($1, $2, $3, $4, $5)"
            )
        };

        // UNION (not UNION ALL) keeps the walk finite on a corrupted cyclic chain.
        let delete = if shape.parent_link {
            format!(
                "WITH RECURSIVE subtree AS ( \
                     SELECT {key} AS id FROM comments WHERE {key} = $1 \
                     UNION \
                     SELECT c.{key} FROM comments c JOIN subtree s ON c.parent_id = s.id \
                 ) \
                 DELETE FROM comments WHERE {key} IN (SELECT id FROM subtree)"
            )
        } else {
            format!("DELETE FROM comments WHERE {key} = $1")
        };

        Self {
            insert,
            get_by_id: format!("SELECT {columns} FROM comments WHERE {key} = $1"),
            get_link: format!("SELECT {key} AS id, post_id, {parent} FROM comments WHERE {key} = $1"),
            list_by_post: format!(
                "SELECT {columns} FROM comments WHERE post_id = $1 \
                 ORDER BY created_at ASC, {key} ASC LIMIT $2"
            ),
            update_body: format!("UPDATE comments SET body = $2 WHERE {key} = $1"),
            delete,
            delete_by_post: "DELETE FROM comments WHERE post_id = $1".to_string(),
        }
    }
}

fn map_comment(row: PgRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        author_id: row.try_get("author_id")?,
        body: row.try_get("body")?,
        parent_id: row.try_get("parent_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_link(row: PgRow) -> Result<CommentLink, sqlx::Error> {
    Ok(CommentLink {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        parent_id: row.try_get("parent_id")?,
    })
}

async fn fetch_comment(pool: &PgPool, sql: &str, id: Uuid) -> StoreResult<Option<Comment>> {
    let row = sqlx::query(sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(map_comment).transpose()?)
}

async fn fetch_link(pool: &PgPool, sql: &str, id: Uuid) -> StoreResult<Option<CommentLink>> {
    let row = sqlx::query(sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(map_link).transpose()?)
}

async fn fetch_by_post(
    pool: &PgPool,
    sql: &str,
    post_id: Uuid,
    limit: i64,
) -> StoreResult<Vec<Comment>> {
    let rows = sqlx::query(sql)
        .bind(post_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    let mut comments = Vec::with_capacity(rows.len());
    for row in rows {
        comments.push(map_comment(row)?);
    }
    Ok(comments)
}

async fn execute_update(pool: &PgPool, sql: &str, id: Uuid, body: &str) -> StoreResult<bool> {
    let result = sqlx::query(sql).bind(id).bind(body).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

async fn execute_delete(pool: &PgPool, sql: &str, id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query(sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}

/// Lists with the adapter's own SQL. When the live table no longer has the
/// columns this adapter expects, the table is probed again and the read is
/// served with SQL for whatever layout is there now.
async fn list_with_reprobe(
    pool: &PgPool,
    shape: SchemaShape,
    queries: &Queries,
    post_id: Uuid,
    limit: i64,
) -> StoreResult<Vec<Comment>> {
    let err = match fetch_by_post(pool, &queries.list_by_post, post_id, limit).await {
        Err(err @ StoreError::SchemaIncompatible(_)) => err,
        other => return other,
    };

    match probe_schema(pool).await? {
        Some(live) if live != shape => {
            tracing::warn!(
                configured = %shape,
                live = %live,
                "comments table layout changed; reading with the live layout"
            );
            let fallback = Queries::new(live);
            fetch_by_post(pool, &fallback.list_by_post, post_id, limit).await
        }
        Some(_) => Err(err),
        None => Err(StoreError::MissingTable),
    }
}

fn expect_single_row(rows: u64) -> StoreResult<()> {
    if rows == 1 {
        Ok(())
    } else {
        Err(StoreError::UnexpectedRowCount(rows))
    }
}

/// Adapter for tables that carry a `parent_id` column.
#[derive(Debug, Clone)]
pub struct ThreadedCommentStore {
    pool: PgPool,
    shape: SchemaShape,
    queries: Queries,
}

impl ThreadedCommentStore {
    pub fn new(pool: PgPool, key: KeyColumn) -> Self {
        let shape = SchemaShape {
            key,
            parent_link: true,
        };
        Self {
            pool,
            shape,
            queries: Queries::new(shape),
        }
    }
}

#[async_trait]
impl CommentStore for ThreadedCommentStore {
    async fn insert(&self, comment: &Comment) -> StoreResult<()> {
        let result = sqlx::query(&self.queries.insert)
            .bind(comment.id)
            .bind(comment.post_id)
            .bind(&comment.author_id)
            .bind(&comment.body)
            .bind(comment.parent_id)
            .bind(comment.created_at)
            .execute(&self.pool)
            .await?;
        expect_single_row(result.rows_affected())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        fetch_comment(&self.pool, &self.queries.get_by_id, id).await
    }

    async fn get_link(&self, id: Uuid) -> StoreResult<Option<CommentLink>> {
        fetch_link(&self.pool, &self.queries.get_link, id).await
    }

    async fn list_by_post(&self, post_id: Uuid, limit: i64) -> StoreResult<Vec<Comment>> {
        list_with_reprobe(&self.pool, self.shape, &self.queries, post_id, limit).await
    }

    async fn update_body(&self, id: Uuid, body: &str) -> StoreResult<bool> {
        execute_update(&self.pool, &self.queries.update_body, id, body).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        execute_delete(&self.pool, &self.queries.delete, id).await
    }

    async fn delete_by_post(&self, post_id: Uuid) -> StoreResult<u64> {
        execute_delete(&self.pool, &self.queries.delete_by_post, post_id).await
    }

    fn supports_parent_link(&self) -> bool {
        true
    }
}

/// Adapter for tables without a `parent_id` column. Threads read back flat.
#[derive(Debug, Clone)]
pub struct FlatCommentStore {
    pool: PgPool,
    shape: SchemaShape,
    queries: Queries,
}

impl FlatCommentStore {
    pub fn new(pool: PgPool, key: KeyColumn) -> Self {
        let shape = SchemaShape {
            key,
            parent_link: false,
        };
        Self {
            pool,
            shape,
            queries: Queries::new(shape),
        }
    }
}

#[async_trait]
impl CommentStore for FlatCommentStore {
    async fn insert(&self, comment: &Comment) -> StoreResult<()> {
        // Dropping the link would silently flatten a reply into a root comment.
        if comment.parent_id.is_some() {
            return Err(StoreError::SchemaIncompatible(
                "reply links (no parent_id column)".to_string(),
            ));
        }
        let result = sqlx::query(&self.queries.insert)
            .bind(comment.id)
            .bind(comment.post_id)
            .bind(&comment.author_id)
            .bind(&comment.body)
            .bind(comment.created_at)
            .execute(&self.pool)
            .await?;
        expect_single_row(result.rows_affected())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        fetch_comment(&self.pool, &self.queries.get_by_id, id).await
    }

    async fn get_link(&self, id: Uuid) -> StoreResult<Option<CommentLink>> {
        fetch_link(&self.pool, &self.queries.get_link, id).await
    }

    async fn list_by_post(&self, post_id: Uuid, limit: i64) -> StoreResult<Vec<Comment>> {
        list_with_reprobe(&self.pool, self.shape, &self.queries, post_id, limit).await
    }

    async fn update_body(&self, id: Uuid, body: &str) -> StoreResult<bool> {
        execute_update(&self.pool, &self.queries.update_body, id, body).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<u64> {
        execute_delete(&self.pool, &self.queries.delete, id).await
    }

    async fn delete_by_post(&self, post_id: Uuid) -> StoreResult<u64> {
        execute_delete(&self.pool, &self.queries.delete_by_post, post_id).await
    }

    fn supports_parent_link(&self) -> bool {
        false
    }
}
