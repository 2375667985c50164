use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{
    CandidateProfile, MatchId, MatchRecord, MatchResponse, MatchStatus, MatchType, UserId,
};

/// One candidate as shown to the requester, with the requester's score for them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    #[serde(flatten)]
    pub profile: CandidateProfile,
    pub age: u32,
    pub preference_score: f64,
    /// Existing requester -> candidate relationship, NONE when absent
    pub match_type: MatchType,
    pub match_status: MatchStatus,
}

impl RecommendationItem {
    pub fn new(profile: &CandidateProfile, age: u32, score: f64, existing: Option<&MatchRecord>) -> Self {
        Self {
            profile: profile.clone(),
            age,
            preference_score: score,
            match_type: existing.map_or(MatchType::None, |m| m.match_type),
            match_status: existing.map_or(MatchStatus::None, |m| m.match_status),
        }
    }
}

/// Response for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RecommendationItem>,
    pub total_candidates: usize,
    pub eligible_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub match_id: MatchId,
    pub match_type: MatchType,
    /// True when this like completed a mutual like
    pub is_mutual: bool,
    pub preference_score: f64,
}

/// Record state after confirm, reject or rematch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchActionResponse {
    pub match_id: MatchId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub match_type: MatchType,
    pub match_status: MatchStatus,
    pub sender_response: MatchResponse,
    pub receiver_response: MatchResponse,
    pub preference_score: f64,
    pub rematch_round: u32,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<&MatchRecord> for MatchActionResponse {
    fn from(record: &MatchRecord) -> Self {
        Self {
            match_id: record.id,
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            match_type: record.match_type,
            match_status: record.match_status,
            sender_response: record.sender_response,
            receiver_response: record.receiver_response,
            preference_score: record.preference_score,
            rematch_round: record.rematch_round,
            confirmed_at: record.confirmed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerInfo {
    pub user_id: UserId,
    /// Absent when the partner's profile is no longer cached
    pub name: Option<String>,
    pub university: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatusItem {
    pub match_id: MatchId,
    pub partner: PartnerInfo,
    pub match_type: MatchType,
    pub match_status: MatchStatus,
    pub my_response: MatchResponse,
    pub partner_response: MatchResponse,
    pub waiting_for_partner: bool,
    pub status_message: String,
    pub preference_score: f64,
    pub rematch_round: u32,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatusResponse {
    pub matches: Vec<MatchStatusItem>,
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultItem {
    pub match_id: MatchId,
    pub sender_id: UserId,
    pub sender_name: Option<String>,
    pub receiver_id: UserId,
    pub receiver_name: Option<String>,
    pub preference_score: f64,
    pub rematch_round: u32,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultResponse {
    pub results: Vec<MatchResultItem>,
}

/// Cache invalidation acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInvalidatedResponse {
    pub invalidated: usize,
    pub generation: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
