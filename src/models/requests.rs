use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::UserId;

/// Query string for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendationQuery {
    #[validate(range(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: UserId,
    #[serde(alias = "sleep_pattern", rename = "sleepPattern")]
    pub sleep_pattern: Option<String>,
    #[serde(alias = "age_range", rename = "ageRange")]
    pub age_range: Option<String>,
    #[serde(alias = "cleaning_frequency", rename = "cleaningFrequency")]
    pub cleaning_frequency: Option<String>,
    #[serde(alias = "start_date", rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "end_date", rename = "endDate")]
    pub end_date: Option<NaiveDate>,
}

/// Caller identity passed as `?userId=`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(range(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: UserId,
}

/// Request to like another user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LikeRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "sender_id", rename = "senderId")]
    pub sender_id: UserId,
    #[validate(range(min = 1))]
    #[serde(alias = "receiver_id", rename = "receiverId")]
    pub receiver_id: UserId,
}

/// Body for confirm, reject and rematch
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ParticipantRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: UserId,
}

/// Request to drop cached candidates after profile writes
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvalidateCacheRequest {
    #[validate(length(max = 10000))]
    #[serde(default, alias = "user_ids", rename = "userIds")]
    pub user_ids: Vec<UserId>,
}
