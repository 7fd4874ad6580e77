use crate::models::UserFeedState;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn get_state(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserFeedState>, sqlx::Error> {
    sqlx::query_as::<_, UserFeedState>(
        r#"
        SELECT user_id, last_seen_feed_item_id, updated_at
        FROM user_feed_state
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Last-write-wins position save. A null feed item id is a valid reset.
/// Rapid scroll updates are expected to be debounced client-side.
pub async fn save_position(
    pool: &PgPool,
    user_id: Uuid,
    feed_item_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_feed_state (user_id, last_seen_feed_item_id, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (user_id)
        DO UPDATE SET last_seen_feed_item_id = EXCLUDED.last_seen_feed_item_id,
                      updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(feed_item_id)
    .execute(pool)
    .await?;

    Ok(())
}
