// Core algorithm exports
pub mod age;
pub mod filters;
pub mod matcher;
pub mod rematch;
pub mod scoring;
pub mod state;

pub use age::{age_band, calculate_age};
pub use filters::{
    is_eligible, matches_filters, overlaps_stay_window, AgeRange, CandidateFilters, CleaningFrequency,
    EligibilityContext, Requester, SleepPattern, StayWindow,
};
pub use matcher::{Matcher, MatchResult, ScoredCandidate, DEFAULT_RECOMMENDATION_LIMIT};
pub use rematch::RematchEligibility;
pub use scoring::{calculate_compatibility, round_score};
pub use state::{apply_state, transition, Decision, MatchState, Responses, TransitionError};
