// Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use unimate_match::core::Matcher;
use unimate_match::models::{CandidateProfile, Gender, PreferenceVector, UserId};
use unimate_match::services::{
    CandidateCache, CandidateCachePort, CollaboratorError, ConversationId, ConversationService, InMemoryStore,
    LoggingConversations, MatchService, Notification, NotificationKind, NotificationService, ProfileStore,
    StoreError,
};

pub const UNIVERSITY: &str = "Hanyang University";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Birth date giving exactly `age` years today.
pub fn born_years_ago(age: i32) -> NaiveDate {
    date(chrono::Local::now().year() - age, 1, 1)
}

pub fn profile(user_id: UserId, gender: Gender, age: i32) -> CandidateProfile {
    CandidateProfile {
        user_id,
        name: format!("Student {}", user_id),
        email: format!("student{}@example.ac.kr", user_id),
        gender,
        university: UNIVERSITY.to_string(),
        birth_date: born_years_ago(age),
        start_use_date: date(2025, 3, 1),
        end_use_date: date(2025, 8, 31),
        sleep_time: 3,
        cleaning_frequency: 3,
        hygiene_level: 3,
        noise_sensitivity: 3,
        drinking_frequency: 2,
        guest_frequency: 2,
        is_smoker: false,
        is_pet_allowed: false,
        is_snoring: false,
        mbti: "INFJ".to_string(),
        student_verified: true,
        matching_enabled: true,
    }
}

/// A preference that every default [`profile`] of age 23-25 fully satisfies.
pub fn preference(user_id: UserId) -> PreferenceVector {
    PreferenceVector {
        user_id,
        sleep_time: Some(3),
        cleaning_frequency: Some(3),
        hygiene_level: Some(3),
        noise_sensitivity: Some(3),
        drinking_frequency: Some(2),
        guest_frequency: Some(2),
        is_smoker: Some(false),
        is_pet_allowed: Some(false),
        is_snoring: Some(false),
        preferred_age_gap: Some(2),
    }
}

/// Records every notification it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn kinds_for(&self, recipient_id: UserId) -> Vec<NotificationKind> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.kind)
            .collect()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl NotificationService for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::UnexpectedStatus {
            status: 503,
            body: "notification service down".to_string(),
        })
    }
}

pub struct FailingConversations;

#[async_trait]
impl ConversationService for FailingConversations {
    async fn open_or_reuse(&self, _a: UserId, _b: UserId) -> Result<ConversationId, CollaboratorError> {
        Err(CollaboratorError::InvalidResponse("chat service down".to_string()))
    }
}

/// A profile source that is never reachable.
#[derive(Default)]
pub struct UnreachableProfiles {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl ProfileStore for UnreachableProfiles {
    async fn list_all_profiles(&self) -> Result<Vec<CandidateProfile>, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::InvalidData("profile store unreachable".to_string()))
    }

    async fn get_profile(&self, _user_id: UserId) -> Result<Option<CandidateProfile>, StoreError> {
        Err(StoreError::InvalidData("profile store unreachable".to_string()))
    }
}

/// Reads the profile, then stalls before handing it back.
pub struct SlowProfiles {
    pub inner: Arc<InMemoryStore>,
    pub delay: std::time::Duration,
}

#[async_trait]
impl ProfileStore for SlowProfiles {
    async fn list_all_profiles(&self) -> Result<Vec<CandidateProfile>, StoreError> {
        self.inner.list_all_profiles().await
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<CandidateProfile>, StoreError> {
        let profile = self.inner.get_profile(user_id).await?;
        tokio::time::sleep(self.delay).await;
        Ok(profile)
    }
}

/// A matching service wired over one in-memory store.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<CandidateCache>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: Arc<MatchService>,
}

impl Harness {
    pub fn new() -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self::build(Arc::new(LoggingConversations), notifier.clone(), notifier)
    }

    pub fn with_failing_collaborators() -> Self {
        Self::build(
            Arc::new(FailingConversations),
            Arc::new(FailingNotifier),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn build(
        conversations: Arc<dyn ConversationService>,
        notifications: Arc<dyn NotificationService>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(CandidateCache::new(store.clone(), 1_000));
        let service = Arc::new(MatchService::new(
            cache.clone(),
            store.clone(),
            store.clone(),
            conversations,
            notifications,
            store.clone(),
            Matcher::with_default_weights(),
        ));

        Self {
            store,
            cache,
            notifier,
            service,
        }
    }

    /// Store a profile with a preference and invalidate its cache entry.
    pub async fn register(&self, profile: CandidateProfile) {
        let user_id = profile.user_id;
        self.store.upsert_profile(profile).await;
        self.store.upsert_preference(preference(user_id)).await;
        self.cache.invalidate_one(user_id).await;
    }

    /// Register a default student of age 24.
    pub async fn student(&self, user_id: UserId) {
        self.register(profile(user_id, Gender::Female, 24)).await;
    }
}
