use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::TransitionError;
use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors surfaced by matching operations.
///
/// Every variant carries a reason the client can render as-is.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl MatchError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        MatchError::NotFound(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        MatchError::Conflict(reason.into())
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        MatchError::BadRequest(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        MatchError::Forbidden(reason.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            MatchError::NotFound(_) => "not_found",
            MatchError::Conflict(_) => "conflict",
            MatchError::BadRequest(_) => "bad_request",
            MatchError::Forbidden(_) => "forbidden",
            MatchError::Store(_) => "internal_error",
        }
    }
}

impl From<StoreError> for MatchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict(id) => {
                MatchError::Conflict(format!("match {} was modified concurrently, retry", id))
            }
            StoreError::Duplicate(what) => MatchError::Conflict(what),
            StoreError::NotFound(what) => MatchError::NotFound(what),
            other => MatchError::Store(other),
        }
    }
}

impl From<TransitionError> for MatchError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadyResponded => MatchError::Conflict(err.to_string()),
            TransitionError::NotARequest | TransitionError::Concluded => MatchError::BadRequest(err.to_string()),
        }
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::Conflict(_) => StatusCode::CONFLICT,
            MatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            MatchError::Forbidden(_) => StatusCode::FORBIDDEN,
            MatchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflicts_map_to_conflict() {
        let err: MatchError = StoreError::VersionConflict(7).into();
        assert!(matches!(err, MatchError::Conflict(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: MatchError = StoreError::Duplicate("already liked".into()).into();
        assert_eq!(err.to_string(), "already liked");
    }

    #[test]
    fn test_repeat_answer_is_conflict() {
        let err: MatchError = TransitionError::AlreadyResponded.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: MatchError = TransitionError::Concluded.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(MatchError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(MatchError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(MatchError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
    }
}
