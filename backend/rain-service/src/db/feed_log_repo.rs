use crate::models::{FeedItem, FeedItemFull, FeedQueueEntry};
use sqlx::PgPool;
use uuid::Uuid;

/// Advisory lock key for per-user promotion. Positions must never repeat,
/// so all promotions for one user serialize on this key; the unique index
/// on (user_id, position) is the backstop if anything bypasses the lock.
fn user_lock_key(user_id: Uuid) -> i64 {
    let bytes = user_id.as_bytes();
    i64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

pub async fn find_owned(
    pool: &PgPool,
    user_id: Uuid,
    feed_item_id: Uuid,
) -> Result<Option<FeedItem>, sqlx::Error> {
    sqlx::query_as::<_, FeedItem>(
        r#"
        SELECT id, chunk_id, user_id, predicted_score, was_explore, shown_at, "position"
        FROM feed_items
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(feed_item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_chunk(
    pool: &PgPool,
    user_id: Uuid,
    chunk_id: Uuid,
) -> Result<Option<FeedItem>, sqlx::Error> {
    sqlx::query_as::<_, FeedItem>(
        r#"
        SELECT id, chunk_id, user_id, predicted_score, was_explore, shown_at, "position"
        FROM feed_items
        WHERE user_id = $1 AND chunk_id = $2
        "#,
    )
    .bind(user_id)
    .bind(chunk_id)
    .fetch_optional(pool)
    .await
}

const ENRICHED_SELECT: &str = r#"
    SELECT fi.id AS feed_item_id,
           fi.chunk_id,
           c.article_id,
           a.title AS article_title,
           a.url AS article_url,
           c.chunk_index,
           c.content,
           fi.predicted_score,
           fi.was_explore,
           fi.shown_at,
           fi."position"
    FROM feed_items fi
    JOIN chunks c ON c.id = fi.chunk_id AND c.user_id = fi.user_id
    JOIN articles a ON a.id = c.article_id AND a.user_id = fi.user_id
"#;

/// Forward page in ascending position order. Entries whose chunk or article
/// is gone drop out via the inner joins rather than failing the page.
pub async fn page_forward(
    pool: &PgPool,
    user_id: Uuid,
    start_position: i64,
    inclusive: bool,
    limit: i64,
) -> Result<Vec<FeedItemFull>, sqlx::Error> {
    let sql = format!(
        r#"{ENRICHED_SELECT}
        WHERE fi.user_id = $1
          AND (fi."position" > $2 OR ($3 AND fi."position" = $2))
        ORDER BY fi."position" ASC
        LIMIT $4
        "#
    );

    sqlx::query_as::<_, FeedItemFull>(&sql)
        .bind(user_id)
        .bind(start_position)
        .bind(inclusive)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Backward page: the `limit` entries closest below `before_position`,
/// returned in descending order. The caller reverses before responding.
pub async fn page_backward(
    pool: &PgPool,
    user_id: Uuid,
    before_position: i64,
    limit: i64,
) -> Result<Vec<FeedItemFull>, sqlx::Error> {
    let sql = format!(
        r#"{ENRICHED_SELECT}
        WHERE fi.user_id = $1 AND fi."position" < $2
        ORDER BY fi."position" DESC
        LIMIT $3
        "#
    );

    sqlx::query_as::<_, FeedItemFull>(&sql)
        .bind(user_id)
        .bind(before_position)
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn enriched_by_ids(
    pool: &PgPool,
    user_id: Uuid,
    feed_item_ids: &[Uuid],
) -> Result<Vec<FeedItemFull>, sqlx::Error> {
    let sql = format!(
        r#"{ENRICHED_SELECT}
        WHERE fi.user_id = $1 AND fi.id = ANY($2)
        ORDER BY fi."position" ASC
        "#
    );

    sqlx::query_as::<_, FeedItemFull>(&sql)
        .bind(user_id)
        .bind(feed_item_ids)
        .fetch_all(pool)
        .await
}

pub async fn exists_before(
    pool: &PgPool,
    user_id: Uuid,
    position: i64,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM feed_items WHERE user_id = $1 AND "position" < $2
        )
        "#,
    )
    .bind(user_id)
    .bind(position)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Promote queue entries into the feed log.
///
/// Runs as one transaction serialized per user: positions are assigned from
/// MAX(position) + 1 upward, inserts dedupe on (user_id, chunk_id), and the
/// queue rows are deleted only after their log inserts — so an interrupted
/// promotion can never drop a scored chunk, and a concurrent reader never
/// sees a chunk in neither queue nor log. Only the given entries' queue rows
/// are deleted. Returns the ids of the newly created feed items.
pub async fn promote_entries(
    pool: &PgPool,
    user_id: Uuid,
    entries: &[FeedQueueEntry],
) -> Result<Vec<Uuid>, sqlx::Error> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(user_lock_key(user_id))
        .execute(&mut *tx)
        .await?;

    let (max_position,): (Option<i64>,) =
        sqlx::query_as(r#"SELECT MAX("position") FROM feed_items WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

    let mut next_position = max_position.unwrap_or(0);
    let mut promoted = Vec::with_capacity(entries.len());

    for entry in entries {
        next_position += 1;
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO feed_items (chunk_id, user_id, predicted_score, was_explore, "position")
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, chunk_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(entry.chunk_id)
        .bind(user_id)
        .bind(entry.predicted_score)
        .bind(entry.was_explore)
        .bind(next_position)
        .fetch_optional(&mut *tx)
        .await?;

        match row {
            Some((id,)) => promoted.push(id),
            // Already in the log from an earlier promotion; the stale queue
            // row still gets cleaned up below.
            None => next_position -= 1,
        }
    }

    let queue_ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
    sqlx::query("DELETE FROM feed_queue WHERE id = ANY($1)")
        .bind(&queue_ids)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(promoted)
}

/// Reroll support: delete log entries past the cut point unless their chunk
/// has been rated. A missing cut point deletes all unrated entries.
pub async fn delete_unrated_after(
    pool: &PgPool,
    user_id: Uuid,
    cut_position: Option<i64>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM feed_items
        WHERE user_id = $1
          AND ($2::BIGINT IS NULL OR "position" > $2)
          AND chunk_id NOT IN (
              SELECT chunk_id FROM chunk_ratings WHERE user_id = $1
          )
        "#,
    )
    .bind(user_id)
    .bind(cut_position)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_stable_per_user() {
        let user = Uuid::new_v4();
        assert_eq!(user_lock_key(user), user_lock_key(user));
        let other = Uuid::new_v4();
        // Distinct users should almost always land on distinct keys.
        assert_ne!(user_lock_key(user), user_lock_key(other));
    }
}
