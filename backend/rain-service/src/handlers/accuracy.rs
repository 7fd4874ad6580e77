use actix_web::{get, web, HttpResponse};

use crate::db::rating_repo;
use crate::error::Result;
use crate::handlers::AppState;
use crate::middleware::jwt_auth::UserId;
use crate::services::accuracy;

/// Prediction accuracy summary: MAE over all/explore/exploit ratings plus
/// per-day timelines.
#[get("")]
pub async fn get_accuracy(user: UserId, state: web::Data<AppState>) -> Result<HttpResponse> {
    let rows = rating_repo::all_for_user(&state.pool, user.0).await?;
    let report = accuracy::build_report(&rows);
    Ok(HttpResponse::Ok().json(report))
}
