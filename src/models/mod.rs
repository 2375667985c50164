// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateProfile, Gender, MatchId, MatchRecord, MatchResponse, MatchStatus, MatchType, NewMatchRecord,
    PreferenceVector, Role, ScoringWeights, UserId,
};
pub use requests::{InvalidateCacheRequest, LikeRequest, ParticipantRequest, RecommendationQuery, UserQuery};
pub use responses::{
    CacheInvalidatedResponse, ErrorResponse, HealthResponse, LikeResponse,
    MatchActionResponse, MatchResultItem, MatchResultResponse, MatchStatusItem, MatchStatusResponse, PartnerInfo,
    RecommendationItem, RecommendationsResponse, StatusSummary,
};
