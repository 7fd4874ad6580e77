use crate::models::Article;
use sqlx::PgPool;
use uuid::Uuid;

/// Fields captured at save time; everything else starts at defaults.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub generated_image_url: Option<String>,
    pub gradient_seed: i64,
}

pub async fn insert_article(
    pool: &PgPool,
    user_id: Uuid,
    article: &NewArticle,
) -> Result<Article, sqlx::Error> {
    sqlx::query_as::<_, Article>(
        r#"
        INSERT INTO articles
            (user_id, url, title, description, image_url, generated_image_url, gradient_seed, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'cloud')
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&article.url)
    .bind(&article.title)
    .bind(&article.description)
    .bind(&article.image_url)
    .bind(&article.generated_image_url)
    .bind(article.gradient_seed)
    .fetch_one(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(
        r#"
        SELECT * FROM articles
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_owned(
    pool: &PgPool,
    user_id: Uuid,
    article_id: Uuid,
) -> Result<Option<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(
        r#"
        SELECT * FROM articles
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(article_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Articles currently feeding the rain (status = cloud).
pub async fn cloud_article_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM articles
        WHERE user_id = $1 AND status = 'cloud'
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Partial update. Status timestamps are stamped inside the statement so a
/// status change and its timestamp can never diverge.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub status: Option<String>,
    pub reading_progress: Option<f64>,
    pub finished: Option<bool>,
    pub notes: Option<String>,
    pub unread_reason: Option<String>,
}

pub async fn update_article(
    pool: &PgPool,
    user_id: Uuid,
    article_id: Uuid,
    update: &ArticleUpdate,
) -> Result<Option<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(
        r#"
        UPDATE articles SET
            status = COALESCE($3, status),
            reading_progress = COALESCE($4, reading_progress),
            finished = COALESCE($5, finished),
            notes = COALESCE($6, notes),
            unread_reason = COALESCE($7, unread_reason),
            moved_to_river_at = CASE WHEN $3 = 'river' THEN now() ELSE moved_to_river_at END,
            moved_to_ocean_at = CASE WHEN $3 = 'ocean' THEN now() ELSE moved_to_ocean_at END
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(article_id)
    .bind(user_id)
    .bind(&update.status)
    .bind(update.reading_progress)
    .bind(update.finished)
    .bind(&update.notes)
    .bind(&update.unread_reason)
    .fetch_optional(pool)
    .await
}

pub async fn delete_article(
    pool: &PgPool,
    user_id: Uuid,
    article_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM articles
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(article_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
