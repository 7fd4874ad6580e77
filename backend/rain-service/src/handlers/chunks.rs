use actix_web::{get, post, web, HttpResponse};
use futures::StreamExt;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::db::{article_repo, chunk_repo, feed_log_repo, rating_repo, settings_repo};
use crate::error::{AppError, Result};
use crate::handlers::AppState;
use crate::middleware::jwt_auth::UserId;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i32,
    pub annotation: Option<String>,
}

/// Rate a shown chunk. Rating is one-time and immutable: a second attempt
/// conflicts no matter how the calls race, and a chunk that never reached
/// the feed log cannot be rated at all.
#[post("/{id}/rate")]
pub async fn rate_chunk(
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<RateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let chunk_id = path.into_inner();

    if !(1..=5).contains(&body.rating) {
        return Err(AppError::ValidationError(
            "Rating must be an integer from 1 to 5".to_string(),
        ));
    }

    let annotation = body
        .annotation
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let shown = feed_log_repo::find_by_chunk(&state.pool, user.0, chunk_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Chunk was not shown to this user".to_string())
        })?;

    let rating = rating_repo::insert_rating(
        &state.pool,
        user.0,
        chunk_id,
        body.rating,
        annotation,
        shown.predicted_score,
        shown.was_explore,
    )
    .await?
    .ok_or_else(|| AppError::Conflict("Chunk already rated".to_string()))?;

    info!(user_id = %user.0, chunk_id = %chunk_id, rating = rating.rating, "chunk rated");
    Ok(HttpResponse::Ok().json(rating))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContextQuery {
    pub stream: Option<bool>,
}

/// Contextualize a chunk against its full source document via the external
/// context generator. `?stream=true` streams the text as it is produced.
#[get("/{id}/context")]
pub async fn chunk_context(
    user: UserId,
    path: web::Path<Uuid>,
    query: web::Query<ContextQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let chunk_id = path.into_inner();

    let chunk = chunk_repo::find_owned(&state.pool, user.0, chunk_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chunk not found".to_string()))?;

    let article = article_repo::find_owned(&state.pool, user.0, chunk.article_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    let settings = settings_repo::get_or_create(&state.pool, user.0).await?;

    // The canonical document text has no safe fallback; failures propagate.
    let full_document = state.fetcher.fetch_markdown(&article.url).await?;

    if query.stream.unwrap_or(false) {
        let deltas = state
            .context
            .stream(&chunk.content, &full_document, &settings.context_model)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let body = deltas.map(|delta| {
            delta
                .map(web::Bytes::from)
                .map_err(|e| AppError::Upstream(e.to_string()))
        });

        return Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .streaming(body));
    }

    let context = state
        .context
        .generate(&chunk.content, &full_document, &settings.context_model)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "context": context })))
}
