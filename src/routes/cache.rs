use actix_web::{web, HttpResponse};

use crate::error::MatchError;
use crate::models::{CacheInvalidatedResponse, InvalidateCacheRequest};
use crate::routes::{validate, AppState};
use crate::services::CandidateCachePort;

/// Cache maintenance routes, called by the profile service after it commits
/// profile writes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/cache/invalidate", web::post().to(invalidate))
        .route("/cache", web::delete().to(invalidate_all))
        .route("/cache/stats", web::get().to(stats));
}

/// POST /api/v1/cache/invalidate with `{ "userIds": [1, 2] }`
async fn invalidate(
    state: web::Data<AppState>,
    req: web::Json<InvalidateCacheRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    match req.user_ids.as_slice() {
        [user_id] => state.cache.invalidate_one(*user_id).await,
        user_ids => state.cache.invalidate_many(user_ids).await,
    }

    Ok(HttpResponse::Ok().json(CacheInvalidatedResponse {
        invalidated: req.user_ids.len(),
        generation: state.cache.stats().generation,
    }))
}

/// DELETE /api/v1/cache
async fn invalidate_all(state: web::Data<AppState>) -> HttpResponse {
    state.cache.invalidate_all().await;

    HttpResponse::Ok().json(CacheInvalidatedResponse {
        invalidated: 0,
        generation: state.cache.stats().generation,
    })
}

/// GET /api/v1/cache/stats
async fn stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.cache.stats())
}
