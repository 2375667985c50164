//! Unimate Match - roommate matching engine for university dormitories
//!
//! Ranks same-university candidates against a user's lifestyle preferences,
//! and drives the like / mutual request / confirmation lifecycle between two
//! students.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{calculate_compatibility, CandidateFilters, Matcher, RematchEligibility};
pub use error::MatchError;
pub use models::{CandidateProfile, MatchRecord, PreferenceVector, ScoringWeights};
pub use services::{CandidateCache, InMemoryStore, MatchService};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(calculate_compatibility(None, None, &ScoringWeights::default(), today), 0.0);
    }
}
