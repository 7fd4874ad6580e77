use crate::models::ChunkRating;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a rating. Rating is a one-time action: the unique index on
/// (user_id, chunk_id) makes concurrent duplicates lose the race, in which
/// case this returns None and the caller maps it to a conflict.
pub async fn insert_rating(
    pool: &PgPool,
    user_id: Uuid,
    chunk_id: Uuid,
    rating: i32,
    annotation: Option<&str>,
    predicted_score: f64,
    was_explore: bool,
) -> Result<Option<ChunkRating>, sqlx::Error> {
    sqlx::query_as::<_, ChunkRating>(
        r#"
        INSERT INTO chunk_ratings
            (chunk_id, user_id, rating, annotation, predicted_score, was_explore)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, chunk_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(chunk_id)
    .bind(user_id)
    .bind(rating)
    .bind(annotation)
    .bind(predicted_score)
    .bind(was_explore)
    .fetch_optional(pool)
    .await
}

/// Most recent ratings first, for few-shot calibration.
pub async fn recent_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ChunkRating>, sqlx::Error> {
    sqlx::query_as::<_, ChunkRating>(
        r#"
        SELECT * FROM chunk_ratings
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// All ratings ascending by creation time, for accuracy reporting.
pub async fn all_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ChunkRating>, sqlx::Error> {
    sqlx::query_as::<_, ChunkRating>(
        r#"
        SELECT * FROM chunk_ratings
        WHERE user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
