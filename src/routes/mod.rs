// Route exports
pub mod cache;
pub mod matches;

use actix_web::{error, web, HttpRequest};
use std::sync::Arc;
use validator::Validate;

use crate::error::MatchError;
use crate::services::{CandidateCache, MatchService, PgStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MatchService>,
    pub cache: Arc<CandidateCache>,
    /// Present when running against PostgreSQL; used by the health check
    pub database: Option<Arc<PgStore>>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(cache::configure),
    );
}

/// Reject a request DTO that fails its `validator` rules.
pub(crate) fn validate<T: Validate>(request: &T) -> Result<(), MatchError> {
    request.validate().map_err(|errors| {
        tracing::info!("Validation failed: {}", errors);
        MatchError::bad_request(format!("Validation failed: {}", errors))
    })
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    MatchError::bad_request(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    MatchError::bad_request(format!("Invalid query: {}", err)).into()
}
