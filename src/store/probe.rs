// src/store/probe.rs

use sqlx::PgPool;

use super::{KeyColumn, SchemaShape, StoreError, StoreResult};

/// Inspects the live `comments` table once and reports its layout.
///
/// Returns `Ok(None)` when the table does not exist yet.
pub async fn probe_schema(pool: &PgPool) -> StoreResult<Option<SchemaShape>> {
    let columns: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT column_name::TEXT
        FROM information_schema.columns
        WHERE table_schema = current_schema()
          AND table_name = 'comments'
        "#,
    )
    .fetch_all(pool)
    .await?;

    shape_from_columns(&columns)
}

/// Maps the column list of the comments table to a known layout.
pub fn shape_from_columns<S: AsRef<str>>(columns: &[S]) -> StoreResult<Option<SchemaShape>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let has = |name: &str| columns.iter().any(|c| c.as_ref().eq_ignore_ascii_case(name));

    let key = if has(KeyColumn::Id.as_str()) {
        KeyColumn::Id
    } else if has(KeyColumn::CommentId.as_str()) {
        KeyColumn::CommentId
    } else {
        return Err(StoreError::SchemaIncompatible(
            "comments table without an id or comment_id column".to_string(),
        ));
    };

    for required in ["post_id", "author_id", "body", "created_at"] {
        if !has(required) {
            return Err(StoreError::SchemaIncompatible(format!(
                "comments table without a {required} column"
            )));
        }
    }

    Ok(Some(SchemaShape {
        key,
        parent_link: has("parent_id"),
    }))
}
