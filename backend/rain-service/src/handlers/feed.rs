use actix_web::{get, post, put, web, HttpResponse};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::db::{feed_log_repo, feed_state_repo, settings_repo};
use crate::error::{AppError, Result};
use crate::handlers::AppState;
use crate::middleware::jwt_auth::UserId;
use crate::models::FeedItemFull;
use crate::services::{feed_reader, FeedCursor};

#[derive(Debug, Default, Deserialize)]
pub struct FeedQueryParams {
    pub from: Option<Uuid>,
    pub after: Option<Uuid>,
    pub before: Option<Uuid>,
    pub limit: Option<i64>,
}

impl FeedQueryParams {
    fn cursor(&self) -> Result<FeedCursor> {
        let given = [self.from, self.after, self.before]
            .iter()
            .filter(|c| c.is_some())
            .count();
        if given > 1 {
            return Err(AppError::BadRequest(
                "At most one of from/after/before may be given".to_string(),
            ));
        }

        Ok(if let Some(id) = self.from {
            FeedCursor::From(id)
        } else if let Some(id) = self.after {
            FeedCursor::After(id)
        } else if let Some(id) = self.before {
            FeedCursor::Before(id)
        } else {
            FeedCursor::Resume
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub items: Vec<FeedItemFull>,
    pub has_more: bool,
    pub has_before: bool,
    pub show_explore_flag: bool,
}

#[get("")]
pub async fn get_feed(
    user: UserId,
    query: web::Query<FeedQueryParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let cursor = query.cursor()?;
    let settings = settings_repo::get_or_create(&state.pool, user.0).await?;
    let limit = query
        .limit
        .unwrap_or(settings.feed_batch_size as i64)
        .clamp(1, 100);

    debug!(user_id = %user.0, ?cursor, limit, "feed read");
    let page = feed_reader::read_page(&state.pool, user.0, cursor, limit).await?;

    Ok(HttpResponse::Ok().json(FeedResponse {
        items: page.items,
        has_more: page.has_more,
        has_before: page.has_before,
        show_explore_flag: settings.show_explore_flag,
    }))
}

#[post("/replenish")]
pub async fn replenish_feed(user: UserId, state: web::Data<AppState>) -> Result<HttpResponse> {
    let settings = settings_repo::get_or_create(&state.pool, user.0).await?;
    let mut rng = StdRng::from_entropy();

    let outcome = state
        .replenisher
        .replenish(&state.pool, &state.scorer, user.0, &settings, &mut rng)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Debug, Default, Deserialize)]
pub struct RerollRequest {
    pub from_feed_item_id: Option<Uuid>,
}

#[post("/reroll")]
pub async fn reroll_feed(
    user: UserId,
    body: Option<web::Json<RerollRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    // The cut point is optional; so is the whole body.
    let explicit_cut = body.and_then(|b| b.from_feed_item_id);
    feed_reader::reroll(&state.pool, user.0, explicit_cut).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub feed_item_id: Option<Uuid>,
}

#[put("/position")]
pub async fn save_position(
    user: UserId,
    body: web::Json<PositionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if let Some(feed_item_id) = body.feed_item_id {
        let owned = feed_log_repo::find_owned(&state.pool, user.0, feed_item_id).await?;
        if owned.is_none() {
            return Err(AppError::BadRequest("Invalid feed item".to_string()));
        }
    }

    feed_state_repo::save_position(&state.pool, user.0, body.feed_item_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_params_resolves_to_resume() {
        let params = FeedQueryParams::default();
        assert_eq!(params.cursor().unwrap(), FeedCursor::Resume);
    }

    #[test]
    fn single_cursor_params_resolve() {
        let id = Uuid::new_v4();
        let params = FeedQueryParams {
            after: Some(id),
            ..Default::default()
        };
        assert_eq!(params.cursor().unwrap(), FeedCursor::After(id));

        let params = FeedQueryParams {
            before: Some(id),
            ..Default::default()
        };
        assert_eq!(params.cursor().unwrap(), FeedCursor::Before(id));

        let params = FeedQueryParams {
            from: Some(id),
            ..Default::default()
        };
        assert_eq!(params.cursor().unwrap(), FeedCursor::From(id));
    }

    #[test]
    fn conflicting_cursor_params_are_rejected() {
        let params = FeedQueryParams {
            from: Some(Uuid::new_v4()),
            after: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(params.cursor().is_err());
    }
}
