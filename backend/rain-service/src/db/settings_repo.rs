use crate::models::{SettingsValues, UserSettings};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn get_settings(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserSettings>, sqlx::Error> {
    sqlx::query_as::<_, UserSettings>("SELECT * FROM user_settings WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Settings are created lazily on first access. The insert ignores
/// conflicts so two concurrent first accesses converge on one row.
pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<UserSettings, sqlx::Error> {
    if let Some(settings) = get_settings(pool, user_id).await? {
        return Ok(settings);
    }

    let defaults = SettingsValues::default();
    sqlx::query(
        r#"
        INSERT INTO user_settings
            (user_id, chunk_size, explore_ratio, feed_batch_size, candidate_pool_size,
             scoring_batch_size, num_few_shot, scoring_model, context_model, show_explore_flag)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(defaults.chunk_size)
    .bind(defaults.explore_ratio)
    .bind(defaults.feed_batch_size)
    .bind(defaults.candidate_pool_size)
    .bind(defaults.scoring_batch_size)
    .bind(defaults.num_few_shot)
    .bind(&defaults.scoring_model)
    .bind(&defaults.context_model)
    .bind(defaults.show_explore_flag)
    .execute(pool)
    .await?;

    let settings =
        sqlx::query_as::<_, UserSettings>("SELECT * FROM user_settings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(settings)
}

pub async fn upsert_settings(
    pool: &PgPool,
    user_id: Uuid,
    values: &SettingsValues,
) -> Result<UserSettings, sqlx::Error> {
    sqlx::query_as::<_, UserSettings>(
        r#"
        INSERT INTO user_settings
            (user_id, chunk_size, explore_ratio, feed_batch_size, candidate_pool_size,
             scoring_batch_size, num_few_shot, scoring_model, context_model, show_explore_flag)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id) DO UPDATE SET
            chunk_size = EXCLUDED.chunk_size,
            explore_ratio = EXCLUDED.explore_ratio,
            feed_batch_size = EXCLUDED.feed_batch_size,
            candidate_pool_size = EXCLUDED.candidate_pool_size,
            scoring_batch_size = EXCLUDED.scoring_batch_size,
            num_few_shot = EXCLUDED.num_few_shot,
            scoring_model = EXCLUDED.scoring_model,
            context_model = EXCLUDED.context_model,
            show_explore_flag = EXCLUDED.show_explore_flag,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(values.chunk_size)
    .bind(values.explore_ratio)
    .bind(values.feed_batch_size)
    .bind(values.candidate_pool_size)
    .bind(values.scoring_batch_size)
    .bind(values.num_few_shot)
    .bind(&values.scoring_model)
    .bind(&values.context_model)
    .bind(values.show_explore_flag)
    .fetch_one(pool)
    .await
}
