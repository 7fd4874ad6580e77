use crate::models::{CandidateChunk, Chunk};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewChunk {
    pub content: String,
    pub word_count: i32,
}

/// Insert an article's chunks in intra-article order. Runs in one
/// transaction so a half-ingested article never becomes a feed source.
pub async fn insert_chunks(
    pool: &PgPool,
    user_id: Uuid,
    article_id: Uuid,
    chunks: &[NewChunk],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for (index, chunk) in chunks.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO chunks (article_id, user_id, chunk_index, content, word_count)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(article_id)
        .bind(user_id)
        .bind(index as i32)
        .bind(&chunk.content)
        .bind(chunk.word_count)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(chunks.len() as u64)
}

pub async fn find_owned(
    pool: &PgPool,
    user_id: Uuid,
    chunk_id: Uuid,
) -> Result<Option<Chunk>, sqlx::Error> {
    sqlx::query_as::<_, Chunk>(
        r#"
        SELECT * FROM chunks
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(chunk_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Chunk contents for few-shot example assembly.
pub async fn contents_by_ids(
    pool: &PgPool,
    user_id: Uuid,
    chunk_ids: &[Uuid],
) -> Result<Vec<(Uuid, String)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, content FROM chunks
        WHERE user_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(chunk_ids)
    .fetch_all(pool)
    .await
}

/// Unseen candidates from a bounded window of the most recent chunks of the
/// given articles. Excludes anything already shown, queued, or rated for
/// this user. The window is ordered deterministically; randomization happens
/// in the caller.
pub async fn candidate_window(
    pool: &PgPool,
    user_id: Uuid,
    article_ids: &[Uuid],
    window: i64,
) -> Result<Vec<CandidateChunk>, sqlx::Error> {
    let rows: Vec<(Uuid, String)> = sqlx::query_as(
        r#"
        SELECT id, content FROM (
            SELECT id, content FROM chunks
            WHERE user_id = $1 AND article_id = ANY($2)
            ORDER BY created_at DESC, chunk_index DESC
            LIMIT $3
        ) recent
        WHERE NOT EXISTS (
            SELECT 1 FROM feed_items fi
            WHERE fi.user_id = $1 AND fi.chunk_id = recent.id
        )
        AND NOT EXISTS (
            SELECT 1 FROM feed_queue fq
            WHERE fq.user_id = $1 AND fq.chunk_id = recent.id
        )
        AND NOT EXISTS (
            SELECT 1 FROM chunk_ratings cr
            WHERE cr.user_id = $1 AND cr.chunk_id = recent.id
        )
        "#,
    )
    .bind(user_id)
    .bind(article_ids)
    .bind(window)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, content)| CandidateChunk { id, content })
        .collect())
}
