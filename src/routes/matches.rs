use actix_web::{web, HttpResponse};

use crate::core::CandidateFilters;
use crate::error::MatchError;
use crate::models::{
    HealthResponse, LikeRequest, MatchId, ParticipantRequest, RecommendationQuery, UserId, UserQuery,
};
use crate::routes::{validate, AppState};

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/recommendations", web::get().to(get_recommendations))
        .route("/matches/candidates/{candidate_id}", web::get().to(get_candidate_detail))
        .route("/matches/likes", web::post().to(send_like))
        .route("/matches/likes/{receiver_id}", web::delete().to(cancel_like))
        .route("/matches/status", web::get().to(get_status))
        .route("/matches/results", web::get().to(get_results))
        .route("/matches/{match_id}/confirm", web::post().to(confirm_match))
        .route("/matches/{match_id}/reject", web::post().to(reject_match))
        .route("/matches/{match_id}/rematch", web::post().to(request_rematch));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match &state.database {
        Some(database) => database.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Ranked roommate recommendations
///
/// GET /api/v1/matches/recommendations?userId=1&sleepPattern=normal&ageRange=23-25
///     &cleaningFrequency=weekly&startDate=2025-03-01&endDate=2025-08-31
async fn get_recommendations(
    state: web::Data<AppState>,
    query: web::Query<RecommendationQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&*query)?;

    let filters = CandidateFilters::parse(
        query.sleep_pattern.as_deref(),
        query.age_range.as_deref(),
        query.cleaning_frequency.as_deref(),
        query.start_date,
        query.end_date,
    )?;

    let response = state.service.get_recommendations(query.user_id, &filters).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/matches/candidates/{candidateId}?userId=1
async fn get_candidate_detail(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&*query)?;

    let detail = state
        .service
        .get_candidate_detail(query.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Like another user
///
/// POST /api/v1/matches/likes
///
/// Request body:
/// ```json
/// { "senderId": 1, "receiverId": 2 }
/// ```
async fn send_like(
    state: web::Data<AppState>,
    req: web::Json<LikeRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let response = state.service.send_like(req.sender_id, req.receiver_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /api/v1/matches/likes/{receiverId}?userId=1
async fn cancel_like(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&*query)?;

    state.service.cancel_like(query.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/matches/{matchId}/confirm with `{ "userId": 1 }`
async fn confirm_match(
    state: web::Data<AppState>,
    path: web::Path<MatchId>,
    req: web::Json<ParticipantRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let response = state.service.confirm_match(path.into_inner(), req.user_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/matches/{matchId}/reject with `{ "userId": 1 }`
async fn reject_match(
    state: web::Data<AppState>,
    path: web::Path<MatchId>,
    req: web::Json<ParticipantRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let response = state.service.reject_match(path.into_inner(), req.user_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/matches/{matchId}/rematch with `{ "userId": 1 }`
async fn request_rematch(
    state: web::Data<AppState>,
    path: web::Path<MatchId>,
    req: web::Json<ParticipantRequest>,
) -> Result<HttpResponse, MatchError> {
    validate(&*req)?;

    let response = state.service.request_rematch(path.into_inner(), req.user_id).await?;
    Ok(HttpResponse::Created().json(response))
}

/// GET /api/v1/matches/status?userId=1
async fn get_status(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&*query)?;

    let response = state.service.get_status(query.user_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/matches/results?userId=1
async fn get_results(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, MatchError> {
    validate(&*query)?;

    let response = state.service.get_results(query.user_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
