use actix_web::{get, put, web, HttpResponse};

use crate::db::settings_repo;
use crate::error::Result;
use crate::handlers::AppState;
use crate::middleware::jwt_auth::UserId;
use crate::models::{sanitize_settings, SettingsUpdate, SettingsValues};

#[get("")]
pub async fn get_settings(user: UserId, state: web::Data<AppState>) -> Result<HttpResponse> {
    let settings = settings_repo::get_or_create(&state.pool, user.0).await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// Replace the user's settings. Fields outside their valid range are
/// clamped; omitted fields reset to defaults.
#[put("")]
pub async fn update_settings(
    user: UserId,
    body: web::Json<SettingsUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let values = sanitize_settings(&body.into_inner(), &SettingsValues::default());
    let settings = settings_repo::upsert_settings(&state.pool, user.0, &values).await?;
    Ok(HttpResponse::Ok().json(settings))
}
