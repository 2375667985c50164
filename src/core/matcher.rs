use chrono::NaiveDate;

use crate::core::{
    filters::{is_eligible, matches_filters, CandidateFilters, EligibilityContext, Requester},
    scoring::calculate_compatibility,
};
use crate::models::{CandidateProfile, PreferenceVector, ScoringWeights};

/// Number of recommendations returned unless configured otherwise.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// A candidate that survived the pipeline, with its compatibility score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub profile: CandidateProfile,
    pub score: f64,
}

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    pub eligible_candidates: usize,
}

/// Candidate filter pipeline - narrows the cached candidate set and ranks survivors
///
/// # Pipeline Stages
/// 1. Mandatory eligibility (self, gender, matching enabled, registered
///    preference, university, active relationship)
/// 2. Optional user filters (sleep pattern, age range, cleaning frequency,
///    stay window)
/// 3. Compatibility scoring and ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    limit: usize,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, limit: usize) -> Self {
        Self { weights, limit }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), DEFAULT_RECOMMENDATION_LIMIT)
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a single candidate against the requester's preferences.
    pub fn score(
        &self,
        preference: Option<&PreferenceVector>,
        candidate: Option<&CandidateProfile>,
        today: NaiveDate,
    ) -> f64 {
        calculate_compatibility(preference, candidate, &self.weights, today)
    }

    /// Rank candidates for a requester.
    ///
    /// # Arguments
    /// * `requester` - Identity of the user asking
    /// * `preference` - The requester's preference vector
    /// * `candidates` - The cached candidate snapshot
    /// * `context` - Registered users and the requester's active partners
    /// * `filters` - Optional validated filters
    /// * `today` - Reference date for age computation
    ///
    /// # Returns
    /// Top candidates sorted by descending score
    pub fn rank_candidates(
        &self,
        requester: &Requester,
        preference: &PreferenceVector,
        candidates: &[CandidateProfile],
        context: &EligibilityContext,
        filters: &CandidateFilters,
        today: NaiveDate,
    ) -> MatchResult {
        let total_candidates = candidates.len();

        let eligible: Vec<&CandidateProfile> = candidates
            .iter()
            // Stage 1: Mandatory eligibility
            .filter(|profile| is_eligible(profile, requester, context))
            // Stage 2: Optional filters
            .filter(|profile| matches_filters(profile, filters, today))
            .collect();

        let eligible_candidates = eligible.len();

        // Stage 3: Scoring
        let mut scored: Vec<ScoredCandidate> = eligible
            .into_iter()
            .map(|profile| ScoredCandidate {
                score: self.score(Some(preference), Some(profile), today),
                profile: profile.clone(),
            })
            .collect();

        // Stable sort keeps snapshot order between equal scores
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored.truncate(self.limit);

        MatchResult {
            matches: scored,
            total_candidates,
            eligible_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
