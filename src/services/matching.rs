use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{
    apply_state, calculate_age, transition, CandidateFilters, Decision, EligibilityContext, MatchState, Matcher,
    RematchEligibility, Requester, Responses,
};
use crate::error::MatchError;
use crate::models::{
    CandidateProfile, LikeResponse, MatchActionResponse, MatchId, MatchRecord,
    MatchResponse, MatchResultItem, MatchResultResponse, MatchStatus, MatchStatusItem, MatchStatusResponse,
    MatchType, NewMatchRecord, PartnerInfo, PreferenceVector, RecommendationItem, RecommendationsResponse,
    Role, StatusSummary, UserId,
};
use crate::services::{
    CandidateCachePort, ConversationId, ConversationService, Notification, NotificationKind, NotificationService,
    PreferenceStore, RelationshipStore, ReviewService, StoreError,
};

const PREFERENCE_NOT_REGISTERED: &str = "preference not registered";
const UNKNOWN_SENDER: &str = "A user";

/// Matching operations exposed to the HTTP layer.
///
/// Relationship state changes are authoritative; conversation and
/// notification calls after them are best-effort and never fail a request.
pub struct MatchService {
    cache: Arc<dyn CandidateCachePort>,
    preferences: Arc<dyn PreferenceStore>,
    relationships: Arc<dyn RelationshipStore>,
    conversations: Arc<dyn ConversationService>,
    notifications: Arc<dyn NotificationService>,
    rematch: RematchEligibility,
    matcher: Matcher,
}

impl MatchService {
    pub fn new(
        cache: Arc<dyn CandidateCachePort>,
        preferences: Arc<dyn PreferenceStore>,
        relationships: Arc<dyn RelationshipStore>,
        conversations: Arc<dyn ConversationService>,
        notifications: Arc<dyn NotificationService>,
        reviews: Arc<dyn ReviewService>,
        matcher: Matcher,
    ) -> Self {
        Self {
            cache,
            preferences,
            relationships,
            conversations,
            notifications,
            rematch: RematchEligibility::new(reviews),
            matcher,
        }
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    async fn require_preference(&self, user_id: UserId) -> Result<PreferenceVector, MatchError> {
        self.preferences
            .get_preference(user_id)
            .await?
            .ok_or_else(|| MatchError::not_found(PREFERENCE_NOT_REGISTERED))
    }

    async fn require_profile(&self, user_id: UserId) -> Result<CandidateProfile, MatchError> {
        self.cache
            .get_candidate_by_id(user_id)
            .await?
            .ok_or_else(|| MatchError::not_found(format!("user {} not found", user_id)))
    }

    async fn require_match(&self, match_id: MatchId) -> Result<MatchRecord, MatchError> {
        self.relationships
            .find_by_id(match_id)
            .await?
            .ok_or_else(|| MatchError::not_found(format!("match {} not found", match_id)))
    }

    async fn display_name(&self, user_id: UserId) -> String {
        match self.cache.get_candidate_by_id(user_id).await {
            Ok(Some(profile)) => profile.name,
            _ => UNKNOWN_SENDER.to_string(),
        }
    }

    async fn notify_quietly(&self, notification: Notification) {
        if let Err(e) = self.notifications.notify(&notification).await {
            tracing::warn!(
                event_id = %notification.event_id,
                recipient_id = notification.recipient_id,
                "Notification failed: {}",
                e
            );
        }
    }

    async fn open_conversation_quietly(&self, a: UserId, b: UserId) -> Option<ConversationId> {
        match self.conversations.open_or_reuse(a, b).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Could not open conversation between {} and {}: {}", a, b, e);
                None
            }
        }
    }

    /// Top-ranked candidates for `requester_id` after eligibility and filters.
    pub async fn get_recommendations(
        &self,
        requester_id: UserId,
        filters: &CandidateFilters,
    ) -> Result<RecommendationsResponse, MatchError> {
        let preference = self.require_preference(requester_id).await?;
        let profile = self.require_profile(requester_id).await?;
        let requester = Requester {
            user_id: requester_id,
            gender: profile.gender,
            university: profile.university.clone(),
        };

        let candidates = self.cache.get_all_candidates().await?;
        let involving = self.relationships.find_involving(requester_id).await?;
        let context = EligibilityContext {
            registered: self.preferences.registered_user_ids().await?,
            active_partners: active_partners(requester_id, &involving),
        };

        let today = Self::today();
        let result = self
            .matcher
            .rank_candidates(&requester, &preference, &candidates, &context, filters, today);

        tracing::info!(
            "Recommendations for user {}: {} of {} eligible ({} cached)",
            requester_id,
            result.matches.len(),
            result.eligible_candidates,
            result.total_candidates
        );

        let recommendations = result
            .matches
            .iter()
            .map(|scored| {
                let existing = sent_to(&involving, requester_id, scored.profile.user_id);
                RecommendationItem::new(
                    &scored.profile,
                    calculate_age(scored.profile.birth_date, today),
                    scored.score,
                    existing,
                )
            })
            .collect();

        Ok(RecommendationsResponse {
            recommendations,
            total_candidates: result.total_candidates,
            eligible_candidates: result.eligible_candidates,
        })
    }

    /// One candidate scored against the requester's preferences.
    pub async fn get_candidate_detail(
        &self,
        requester_id: UserId,
        candidate_id: UserId,
    ) -> Result<RecommendationItem, MatchError> {
        self.require_profile(requester_id).await?;
        let preference = self.require_preference(requester_id).await?;
        let candidate = self.require_profile(candidate_id).await?;
        self.require_preference(candidate_id).await?;

        let today = Self::today();
        let score = self.matcher.score(Some(&preference), Some(&candidate), today);

        let involving = self.relationships.find_by_pair(requester_id, candidate_id).await?;

        Ok(RecommendationItem::new(
            &candidate,
            calculate_age(candidate.birth_date, today),
            score,
            involving.first(),
        ))
    }

    /// Like `receiver_id`. Completing a mutual like upgrades the existing
    /// record to a pending roommate request.
    pub async fn send_like(&self, sender_id: UserId, receiver_id: UserId) -> Result<LikeResponse, MatchError> {
        if sender_id == receiver_id {
            return Err(MatchError::bad_request("you cannot like yourself"));
        }

        self.require_preference(receiver_id).await?;
        let sender = self.require_profile(sender_id).await?;
        let receiver = self.require_profile(receiver_id).await?;

        // A first like racing the other side's first like hits the unordered
        // pair key; re-reading the pair then finds that like and completes it.
        let mut retried = false;
        let created = loop {
            let same_direction = self.relationships.find_by_pair(sender_id, receiver_id).await?;
            let opposite_direction = self.relationships.find_by_pair(receiver_id, sender_id).await?;

            let request_exists = same_direction
                .iter()
                .chain(opposite_direction.iter())
                .any(|m| m.match_type == MatchType::Request);
            if request_exists {
                return Err(MatchError::conflict("a roommate request already exists between these users"));
            }

            if same_direction.iter().any(|m| m.match_type == MatchType::Like) {
                return Err(MatchError::conflict("you have already liked this user"));
            }

            if let Some(existing) = opposite_direction.into_iter().find(|m| m.match_type == MatchType::Like) {
                return self.complete_mutual_like(existing, &sender, &receiver).await;
            }

            let preference = self.require_preference(sender_id).await?;
            let score = self.matcher.score(Some(&preference), Some(&receiver), Self::today());

            match self
                .relationships
                .create(NewMatchRecord::like(sender_id, receiver_id, score))
                .await
            {
                Ok(created) => break created,
                Err(StoreError::Duplicate(_)) if !retried => {
                    tracing::debug!("Concurrent like between {} and {}, re-reading the pair", sender_id, receiver_id);
                    retried = true;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            "User {} liked user {} (score {:.2})",
            sender_id,
            receiver_id,
            created.preference_score
        );

        self.notify_quietly(Notification::new(
            receiver_id,
            NotificationKind::Like,
            format!("{} liked you", sender.name),
            sender_id,
            &sender.name,
        ))
        .await;

        Ok(LikeResponse {
            match_id: created.id,
            match_type: created.match_type,
            is_mutual: false,
            preference_score: created.preference_score,
        })
    }

    async fn complete_mutual_like(
        &self,
        mut record: MatchRecord,
        sender: &CandidateProfile,
        receiver: &CandidateProfile,
    ) -> Result<LikeResponse, MatchError> {
        // The user completing the mutual like becomes the sender
        record.sender_id = sender.user_id;
        record.receiver_id = receiver.user_id;
        apply_state(&mut record, MatchState::Requested(Responses::PENDING), Utc::now());

        let saved = self.relationships.save(&record).await?;

        tracing::info!(
            "Mutual like between {} and {}, match {} is now a request",
            sender.user_id,
            receiver.user_id,
            saved.id
        );

        let conversation_id = self.open_conversation_quietly(sender.user_id, receiver.user_id).await;

        for (recipient, partner) in [(receiver, sender), (sender, receiver)] {
            self.notify_quietly(
                Notification::new(
                    recipient.user_id,
                    NotificationKind::Match,
                    format!("You and {} liked each other", partner.name),
                    partner.user_id,
                    &partner.name,
                )
                .in_conversation(conversation_id),
            )
            .await;
        }

        Ok(LikeResponse {
            match_id: saved.id,
            match_type: saved.match_type,
            is_mutual: true,
            preference_score: saved.preference_score,
        })
    }

    /// Withdraw a like that has not become mutual yet.
    pub async fn cancel_like(&self, sender_id: UserId, receiver_id: UserId) -> Result<(), MatchError> {
        let like = self
            .relationships
            .find_by_pair(sender_id, receiver_id)
            .await?
            .into_iter()
            .find(|m| m.match_type == MatchType::Like)
            .ok_or_else(|| MatchError::not_found("there is no like to cancel"))?;

        self.relationships.delete(like.id).await?;

        tracing::info!("User {} cancelled like on user {}", sender_id, receiver_id);

        let sender_name = self.display_name(sender_id).await;
        self.notify_quietly(Notification::new(
            receiver_id,
            NotificationKind::LikeCanceled,
            format!("{} cancelled their like", sender_name),
            sender_id,
            &sender_name,
        ))
        .await;

        Ok(())
    }

    pub async fn confirm_match(&self, match_id: MatchId, user_id: UserId) -> Result<MatchActionResponse, MatchError> {
        self.respond(match_id, user_id, Decision::Accept).await
    }

    pub async fn reject_match(&self, match_id: MatchId, user_id: UserId) -> Result<MatchActionResponse, MatchError> {
        self.respond(match_id, user_id, Decision::Reject).await
    }

    async fn respond(
        &self,
        match_id: MatchId,
        user_id: UserId,
        decision: Decision,
    ) -> Result<MatchActionResponse, MatchError> {
        let mut record = self.require_match(match_id).await?;

        self.require_preference(record.sender_id).await?;
        self.require_preference(record.receiver_id).await?;

        let role = record
            .role_of(user_id)
            .ok_or_else(|| MatchError::forbidden("you are not a participant in this match"))?;

        let state = MatchState::of_record(&record)?;
        let next = transition(state, role, decision)?;
        apply_state(&mut record, next, Utc::now());

        let saved = self.relationships.save(&record).await?;

        tracing::info!(
            "User {} answered {:?} on match {}, status now {}",
            user_id,
            decision,
            match_id,
            saved.match_status
        );

        Ok(MatchActionResponse::from(&saved))
    }

    /// Every record involving `user_id`, newest first, with a summary.
    pub async fn get_status(&self, user_id: UserId) -> Result<MatchStatusResponse, MatchError> {
        let records = self.relationships.find_involving(user_id).await?;

        let mut summary = StatusSummary {
            total: records.len(),
            ..Default::default()
        };
        let mut matches = Vec::with_capacity(records.len());

        for record in &records {
            match record.match_status {
                MatchStatus::Pending => summary.pending += 1,
                MatchStatus::Accepted => summary.accepted += 1,
                MatchStatus::Rejected => summary.rejected += 1,
                MatchStatus::None => {}
            }

            let Some(role) = record.role_of(user_id) else {
                continue;
            };
            let partner_id = record.partner_of(user_id);
            let partner = self.cache.get_candidate_by_id(partner_id).await?;

            let my_response = record.response_of(role);
            let partner_response = record.response_of(other_role(role));
            let waiting_for_partner = record.match_type == MatchType::Request
                && record.match_status == MatchStatus::Pending
                && my_response != MatchResponse::Pending
                && partner_response == MatchResponse::Pending;

            matches.push(MatchStatusItem {
                match_id: record.id,
                partner: PartnerInfo {
                    user_id: partner_id,
                    name: partner.as_ref().map(|p| p.name.clone()),
                    university: partner.map(|p| p.university),
                },
                match_type: record.match_type,
                match_status: record.match_status,
                my_response,
                partner_response,
                waiting_for_partner,
                status_message: status_message(record, role).to_string(),
                preference_score: record.preference_score,
                rematch_round: record.rematch_round,
                created_at: record.created_at,
                confirmed_at: record.confirmed_at,
            });
        }

        Ok(MatchStatusResponse { matches, summary })
    }

    /// Confirmed roommate matches for `user_id`.
    pub async fn get_results(&self, user_id: UserId) -> Result<MatchResultResponse, MatchError> {
        let records = self.relationships.find_involving(user_id).await?;
        let mut results = Vec::new();

        for record in records.iter().filter(|m| m.match_status == MatchStatus::Accepted) {
            let sender = self.cache.get_candidate_by_id(record.sender_id).await?;
            let receiver = self.cache.get_candidate_by_id(record.receiver_id).await?;

            results.push(MatchResultItem {
                match_id: record.id,
                sender_id: record.sender_id,
                sender_name: sender.map(|p| p.name),
                receiver_id: record.receiver_id,
                receiver_name: receiver.map(|p| p.name),
                preference_score: record.preference_score,
                rematch_round: record.rematch_round,
                confirmed_at: record.confirmed_at,
            });
        }

        Ok(MatchResultResponse { results })
    }

    /// Reintroduce the pair of an accepted match as a new request round.
    ///
    /// Both participants must have reviewed the match and agreed to a rematch.
    pub async fn request_rematch(
        &self,
        match_id: MatchId,
        requester_id: UserId,
    ) -> Result<MatchActionResponse, MatchError> {
        let record = self.require_match(match_id).await?;
        let next_round = self.rematch.validate_and_get_next_round(&record, true).await?;

        if !record.is_participant(requester_id) {
            return Err(MatchError::forbidden("you are not a participant in this match"));
        }
        let partner_id = record.partner_of(requester_id);

        let existing = self.relationships.find_involving(requester_id).await?;
        if existing
            .iter()
            .any(|m| m.connects(requester_id, partner_id) && m.rematch_round == next_round)
        {
            return Err(MatchError::conflict("a rematch has already been requested for this match"));
        }

        let created = self
            .relationships
            .create(NewMatchRecord::rematch(
                requester_id,
                partner_id,
                record.preference_score,
                next_round,
            ))
            .await?;

        tracing::info!(
            "User {} requested rematch of match {} (round {})",
            requester_id,
            match_id,
            next_round
        );

        let conversation_id = self.open_conversation_quietly(requester_id, partner_id).await;
        let requester_name = self.display_name(requester_id).await;
        self.notify_quietly(
            Notification::new(
                partner_id,
                NotificationKind::Rematch,
                format!("{} would like to room with you again", requester_name),
                requester_id,
                &requester_name,
            )
            .in_conversation(conversation_id),
        )
        .await;

        Ok(MatchActionResponse::from(&created))
    }
}

/// Users in an active relationship with `user_id`: a request that is
/// pending or accepted, in either direction.
fn active_partners(user_id: UserId, records: &[MatchRecord]) -> HashSet<UserId> {
    records
        .iter()
        .filter(|m| m.match_type == MatchType::Request)
        .filter(|m| matches!(m.match_status, MatchStatus::Pending | MatchStatus::Accepted))
        .map(|m| m.partner_of(user_id))
        .collect()
}

/// Newest record sent from `sender_id` to `receiver_id`.
fn sent_to(records: &[MatchRecord], sender_id: UserId, receiver_id: UserId) -> Option<&MatchRecord> {
    records
        .iter()
        .find(|m| m.sender_id == sender_id && m.receiver_id == receiver_id)
}

fn other_role(role: Role) -> Role {
    match role {
        Role::Sender => Role::Receiver,
        Role::Receiver => Role::Sender,
    }
}

fn status_message(record: &MatchRecord, role: Role) -> &'static str {
    match (record.match_type, record.match_status) {
        (_, MatchStatus::Accepted) => "you are roommates",
        (_, MatchStatus::Rejected) => "this match was declined",
        (MatchType::Like, _) if role == Role::Sender => "waiting for them to like you back",
        (MatchType::Like, _) => "this user liked you",
        (MatchType::Request, _) if record.response_of(role) == MatchResponse::Pending => {
            "waiting for your response"
        }
        (MatchType::Request, _) => "waiting for your partner's response",
        (MatchType::None, _) => "no match yet",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_partners_ignore_likes_and_rejections() {
        let like = NewMatchRecord::like(1, 2, 0.5).into_record(1);

        let mut pending = NewMatchRecord::like(3, 1, 0.5).into_record(2);
        pending.match_type = MatchType::Request;

        let mut rejected = NewMatchRecord::like(1, 4, 0.5).into_record(3);
        rejected.match_type = MatchType::Request;
        rejected.match_status = MatchStatus::Rejected;

        let mut accepted = NewMatchRecord::like(1, 5, 0.5).into_record(4);
        accepted.match_type = MatchType::Request;
        accepted.match_status = MatchStatus::Accepted;

        let partners = active_partners(1, &[like, pending, rejected, accepted]);
        assert_eq!(partners, HashSet::from([3, 5]));
    }

    #[test]
    fn test_status_messages_depend_on_role() {
        let mut record = NewMatchRecord::like(1, 2, 0.5).into_record(1);
        assert_eq!(status_message(&record, Role::Sender), "waiting for them to like you back");
        assert_eq!(status_message(&record, Role::Receiver), "this user liked you");

        record.match_type = MatchType::Request;
        record.sender_response = MatchResponse::Accepted;
        assert_eq!(status_message(&record, Role::Sender), "waiting for your partner's response");
        assert_eq!(status_message(&record, Role::Receiver), "waiting for your response");
    }
}
