use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::article_repo::{self, ArticleUpdate, NewArticle};
use crate::db::chunk_repo::{self, NewChunk};
use crate::db::settings_repo;
use crate::error::{AppError, Result};
use crate::handlers::AppState;
use crate::middleware::jwt_auth::UserId;
use crate::models::ArticleStatus;
use crate::services::chunker;
use crate::services::prompts::url_to_seed;

#[get("")]
pub async fn list_articles(user: UserId, state: web::Data<AppState>) -> Result<HttpResponse> {
    let articles = article_repo::list_for_user(&state.pool, user.0).await?;
    Ok(HttpResponse::Ok().json(articles))
}

#[derive(Debug, Deserialize)]
pub struct SaveArticleRequest {
    pub url: String,
}

/// Save an article: scrape metadata, synthesize a thumbnail when the page
/// has none, then fetch the cleaned markdown and chunk it into feed slices.
#[post("")]
pub async fn save_article(
    user: UserId,
    body: web::Json<SaveArticleRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let url = body.url.trim().to_string();
    if url.is_empty() {
        return Err(AppError::ValidationError("URL is required".to_string()));
    }

    let parsed = reqwest::Url::parse(&url)
        .map_err(|_| AppError::ValidationError("Invalid URL".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::ValidationError("Invalid URL".to_string()));
    }

    let settings = settings_repo::get_or_create(&state.pool, user.0).await?;

    // Metadata and OG image are best-effort; the hostname is the floor.
    let (meta_title, description) = state.fetcher.fetch_metadata(&url).await;
    let scrape = state.fetcher.scrape_page(&url).await;

    let title = meta_title
        .or(scrape.title)
        .unwrap_or_else(|| parsed.host_str().unwrap_or("untitled").to_string());

    let gradient_seed = url_to_seed(&url);
    let generated_image_url = if scrape.image_url.is_none() {
        state.imagery.generate(gradient_seed).await
    } else {
        None
    };

    let article = article_repo::insert_article(
        &state.pool,
        user.0,
        &NewArticle {
            url: url.clone(),
            title,
            description,
            image_url: scrape.image_url,
            generated_image_url,
            gradient_seed,
        },
    )
    .await?;

    // Ingest the text now so the article can start raining. A fetch failure
    // leaves the article saved with no chunks; it simply yields no
    // candidates until re-saved.
    match state.fetcher.fetch_markdown(&url).await {
        Ok(markdown) => {
            let chunks: Vec<NewChunk> = chunker::chunk_text(&markdown, settings.chunk_size as usize)
                .into_iter()
                .map(|c| NewChunk {
                    content: c.content,
                    word_count: c.word_count,
                })
                .collect();
            let inserted = chunk_repo::insert_chunks(&state.pool, user.0, article.id, &chunks).await?;
            info!(user_id = %user.0, article_id = %article.id, chunks = inserted, "article ingested");
        }
        Err(e) => {
            warn!(user_id = %user.0, article_id = %article.id, error = %e, "content fetch failed, article saved without chunks");
        }
    }

    Ok(HttpResponse::Ok().json(article))
}

#[derive(Debug, Deserialize)]
pub struct ArticleUpdateRequest {
    pub status: Option<String>,
    pub reading_progress: Option<f64>,
    pub finished: Option<bool>,
    pub notes: Option<String>,
    pub unread_reason: Option<String>,
}

#[patch("/{id}")]
pub async fn update_article(
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<ArticleUpdateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let article_id = path.into_inner();

    let status = match &body.status {
        Some(raw) => {
            let next = ArticleStatus::parse(raw).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown article status: {}", raw))
            })?;

            let current = article_repo::find_owned(&state.pool, user.0, article_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

            if let Some(current_status) = ArticleStatus::parse(&current.status) {
                if !current_status.can_transition_to(next) {
                    return Err(AppError::BadRequest(format!(
                        "Article is already {}",
                        current_status
                    )));
                }
            }
            Some(next.as_str().to_string())
        }
        None => None,
    };

    let updated = article_repo::update_article(
        &state.pool,
        user.0,
        article_id,
        &ArticleUpdate {
            status,
            reading_progress: body.reading_progress,
            finished: body.finished,
            notes: body.notes.clone(),
            unread_reason: body.unread_reason.clone(),
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Article not found".to_string()))?;

    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/{id}")]
pub async fn delete_article(
    user: UserId,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let deleted = article_repo::delete_article(&state.pool, user.0, path.into_inner()).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Article not found".to_string()));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
