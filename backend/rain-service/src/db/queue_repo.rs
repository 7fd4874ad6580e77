use crate::models::{FeedQueueEntry, QueuedCandidate};
use sqlx::PgPool;
use uuid::Uuid;

/// Idempotent queue insert: a chunk already queued for this user keeps its
/// first score and the duplicate is silently dropped. Returns how many rows
/// were actually inserted.
pub async fn insert_batch(
    pool: &PgPool,
    user_id: Uuid,
    candidates: &[QueuedCandidate],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0u64;
    let mut tx = pool.begin().await?;

    for candidate in candidates {
        let result = sqlx::query(
            r#"
            INSERT INTO feed_queue (chunk_id, user_id, predicted_score, was_explore)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, chunk_id) DO NOTHING
            "#,
        )
        .bind(candidate.chunk_id)
        .bind(user_id)
        .bind(candidate.predicted_score)
        .bind(candidate.was_explore)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM feed_queue WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Oldest-inserted entries first (FIFO by creation time).
pub async fn oldest_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<FeedQueueEntry>, sqlx::Error> {
    sqlx::query_as::<_, FeedQueueEntry>(
        r#"
        SELECT * FROM feed_queue
        WHERE user_id = $1
        ORDER BY created_at ASC, id ASC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Drop every queued entry for the user, forcing a full re-score on the
/// next replenish.
pub async fn clear_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM feed_queue WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
