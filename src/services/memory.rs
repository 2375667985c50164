use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::models::{CandidateProfile, MatchId, MatchRecord, NewMatchRecord, PreferenceVector, UserId};
use crate::services::{PreferenceStore, ProfileStore, RelationshipStore, ReviewService, StoreError};

#[derive(Debug, Default)]
struct State {
    profiles: BTreeMap<UserId, CandidateProfile>,
    preferences: HashMap<UserId, PreferenceVector>,
    matches: BTreeMap<MatchId, MatchRecord>,
    /// (match, reviewer) -> consents to a rematch
    reviews: HashMap<(MatchId, UserId), bool>,
    next_match_id: MatchId,
}

/// Process-local implementation of every store port.
///
/// Used for local development (`storage.backend = "memory"`) and tests. Writes
/// here do not touch the candidate cache; callers invalidate it themselves.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    profile_scans: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert_profile(&self, profile: CandidateProfile) {
        self.state.write().await.profiles.insert(profile.user_id, profile);
    }

    pub async fn remove_profile(&self, user_id: UserId) {
        self.state.write().await.profiles.remove(&user_id);
    }

    pub async fn upsert_preference(&self, preference: PreferenceVector) {
        self.state.write().await.preferences.insert(preference.user_id, preference);
    }

    pub async fn submit_review(&self, match_id: MatchId, reviewer_id: UserId, can_rematch: bool) {
        self.state
            .write()
            .await
            .reviews
            .insert((match_id, reviewer_id), can_rematch);
    }

    /// How many times the full profile list has been read.
    pub fn profile_scans(&self) -> usize {
        self.profile_scans.load(Ordering::SeqCst)
    }

    pub async fn match_count(&self) -> usize {
        self.state.read().await.matches.len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn list_all_profiles(&self) -> Result<Vec<CandidateProfile>, StoreError> {
        self.profile_scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.read().await.profiles.values().cloned().collect())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<CandidateProfile>, StoreError> {
        Ok(self.state.read().await.profiles.get(&user_id).cloned())
    }
}

#[async_trait]
impl PreferenceStore for InMemoryStore {
    async fn get_preference(&self, user_id: UserId) -> Result<Option<PreferenceVector>, StoreError> {
        Ok(self.state.read().await.preferences.get(&user_id).cloned())
    }

    async fn registered_user_ids(&self) -> Result<HashSet<UserId>, StoreError> {
        Ok(self.state.read().await.preferences.keys().copied().collect())
    }
}

#[async_trait]
impl RelationshipStore for InMemoryStore {
    async fn create(&self, record: NewMatchRecord) -> Result<MatchRecord, StoreError> {
        let mut state = self.state.write().await;

        let duplicate = state
            .matches
            .values()
            .any(|m| m.connects(record.sender_id, record.receiver_id) && m.rematch_round == record.rematch_round);
        if duplicate {
            return Err(StoreError::Duplicate(
                "a match between these users already exists".to_string(),
            ));
        }

        state.next_match_id += 1;
        let created = record.into_record(state.next_match_id);
        state.matches.insert(created.id, created.clone());

        Ok(created)
    }

    async fn save(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError> {
        let mut state = self.state.write().await;

        let stored = state
            .matches
            .get_mut(&record.id)
            .ok_or_else(|| StoreError::NotFound(format!("match {}", record.id)))?;

        if stored.version != record.version {
            return Err(StoreError::VersionConflict(record.id));
        }

        let mut saved = record.clone();
        saved.version += 1;
        *stored = saved.clone();

        Ok(saved)
    }

    async fn delete(&self, id: MatchId) -> Result<(), StoreError> {
        self.state.write().await.matches.remove(&id);
        Ok(())
    }

    async fn find_by_pair(&self, sender_id: UserId, receiver_id: UserId) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.read().await;
        let mut found: Vec<MatchRecord> = state
            .matches
            .values()
            .filter(|m| m.sender_id == sender_id && m.receiver_id == receiver_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn find_by_id(&self, id: MatchId) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.state.read().await.matches.get(&id).cloned())
    }

    async fn find_involving(&self, user_id: UserId) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.read().await;
        let mut found: Vec<MatchRecord> = state
            .matches
            .values()
            .filter(|m| m.is_participant(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }
}

#[async_trait]
impl ReviewService for InMemoryStore {
    async fn has_both_reviews(&self, record: &MatchRecord) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        Ok(state.reviews.contains_key(&(record.id, record.sender_id))
            && state.reviews.contains_key(&(record.id, record.receiver_id)))
    }

    async fn both_consent_to_rematch(&self, record: &MatchRecord) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        let consents = |user_id| state.reviews.get(&(record.id, user_id)).copied().unwrap_or(false);
        Ok(consents(record.sender_id) && consents(record.receiver_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_requires_current_version() {
        let store = InMemoryStore::new();
        let created = store.create(NewMatchRecord::like(1, 2, 0.5)).await.unwrap();

        let saved = store.save(&created).await.unwrap();
        assert_eq!(saved.version, 1);

        // A writer holding the old copy loses
        let err = store.save(&created).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(id) if id == created.id));
    }

    #[tokio::test]
    async fn test_duplicate_pair_rejected() {
        let store = InMemoryStore::new();
        store.create(NewMatchRecord::like(1, 2, 0.5)).await.unwrap();
        assert!(matches!(
            store.create(NewMatchRecord::like(1, 2, 0.5)).await,
            Err(StoreError::Duplicate(_))
        ));
        // The pair is unordered
        assert!(matches!(
            store.create(NewMatchRecord::like(2, 1, 0.5)).await,
            Err(StoreError::Duplicate(_))
        ));
        // A later round is a new record
        assert!(store.create(NewMatchRecord::rematch(2, 1, 0.5, 1)).await.is_ok());
    }
}
