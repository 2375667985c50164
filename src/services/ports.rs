//! Interfaces the matching core needs from the rest of the system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{CandidateProfile, MatchId, MatchRecord, NewMatchRecord, PreferenceVector, UserId};

/// Errors that can occur in a backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Duplicate(String),

    #[error("match {0} was modified concurrently")]
    VersionConflict(MatchId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A load shared between concurrent cache readers failed.
    #[error("candidate cache load failed: {0}")]
    CacheLoad(Arc<StoreError>),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_all_profiles(&self) -> Result<Vec<CandidateProfile>, StoreError>;
    async fn get_profile(&self, user_id: UserId) -> Result<Option<CandidateProfile>, StoreError>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_preference(&self, user_id: UserId) -> Result<Option<PreferenceVector>, StoreError>;

    /// Every user with a registered preference vector.
    async fn registered_user_ids(&self) -> Result<HashSet<UserId>, StoreError>;
}

#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Insert a record. Fails with [`StoreError::Duplicate`] when the same
    /// `(sender, receiver, round)` already exists.
    async fn create(&self, record: NewMatchRecord) -> Result<MatchRecord, StoreError>;

    /// Persist a modified record if its `version` is still current.
    /// Returns the record with the bumped version.
    async fn save(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError>;

    async fn delete(&self, id: MatchId) -> Result<(), StoreError>;

    /// Records sent from `sender_id` to `receiver_id` (exact direction).
    async fn find_by_pair(&self, sender_id: UserId, receiver_id: UserId) -> Result<Vec<MatchRecord>, StoreError>;

    async fn find_by_id(&self, id: MatchId) -> Result<Option<MatchRecord>, StoreError>;

    /// Records where the user is sender or receiver, newest first.
    async fn find_involving(&self, user_id: UserId) -> Result<Vec<MatchRecord>, StoreError>;
}

/// Review signals consumed by the rematch gate.
#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn has_both_reviews(&self, record: &MatchRecord) -> Result<bool, StoreError>;
    async fn both_consent_to_rematch(&self, record: &MatchRecord) -> Result<bool, StoreError>;
}

pub type ConversationId = i64;

/// Opens (or reuses) the chat channel between two users.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn open_or_reuse(&self, a: UserId, b: UserId) -> Result<ConversationId, CollaboratorError>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError>;
}

/// Errors from best-effort collaborators; never surfaced to callers.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("collaborator returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Like,
    LikeCanceled,
    Match,
    Rematch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub event_id: uuid::Uuid,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub conversation_id: Option<ConversationId>,
}

impl Notification {
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        message: String,
        sender_id: UserId,
        sender_name: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4(),
            recipient_id,
            kind,
            message,
            sender_id,
            sender_name: sender_name.to_string(),
            conversation_id: None,
        }
    }

    pub fn in_conversation(mut self, conversation_id: Option<ConversationId>) -> Self {
        self.conversation_id = conversation_id;
        self
    }
}
