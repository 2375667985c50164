use chrono::NaiveDate;

use crate::core::age::{age_band, calculate_age};
use crate::models::{CandidateProfile, PreferenceVector, ScoringWeights};

/// Distance between the ends of the 1-5 ordinal scale.
const SCALE_RANGE: u32 = 4;

/// Partial scores are held as eighths: ordinal steps are quarters and
/// composites average two of them.
const PARTIAL_UNITS: u32 = 8;

/// Weights are held in basis points.
const WEIGHT_UNITS: f64 = 10_000.0;

/// Calculate the compatibility (0.0-1.0, two decimals) of a candidate
/// against one user's stated preferences.
///
/// Scoring formula:
/// score = (
///     smoking      * 0.20 +   # equal boolean
///     sleep        * 0.20 +   # ordinal distance
///     cleanliness  * 0.20 +   # avg(cleaning frequency, hygiene level)
///     age          * 0.10 +   # ordinal distance between age bands
///     noise        * 0.10 +   # avg(noise sensitivity, snoring)
///     pet          * 0.10 +   # equal boolean
///     lifestyle    * 0.10     # avg(drinking frequency, guest frequency)
/// )
///
/// The weighted sum is accumulated in integer units (eighths times basis
/// points) so a total sitting exactly on a half cent rounds up.
///
/// A missing argument scores 0.0, as does any attribute the preference
/// leaves unset.
pub fn calculate_compatibility(
    preference: Option<&PreferenceVector>,
    profile: Option<&CandidateProfile>,
    weights: &ScoringWeights,
    today: NaiveDate,
) -> f64 {
    let (Some(preference), Some(profile)) = (preference, profile) else {
        return 0.0;
    };

    let smoking = boolean_units(preference.is_smoker, Some(profile.is_smoker));
    let sleep = ordinal_units(preference.sleep_time, Some(profile.sleep_time));
    let pet = boolean_units(preference.is_pet_allowed, Some(profile.is_pet_allowed));
    let age = age_units(preference.preferred_age_gap, profile.birth_date, today);

    // Both halves are even, so the average stays whole
    let cleanliness = (ordinal_units(preference.cleaning_frequency, Some(profile.cleaning_frequency))
        + ordinal_units(preference.hygiene_level, Some(profile.hygiene_level)))
        / 2;

    let noise = (ordinal_units(preference.noise_sensitivity, Some(profile.noise_sensitivity))
        + boolean_units(preference.is_snoring, Some(profile.is_snoring)))
        / 2;

    let lifestyle = (ordinal_units(preference.drinking_frequency, Some(profile.drinking_frequency))
        + ordinal_units(preference.guest_frequency, Some(profile.guest_frequency)))
        / 2;

    let total = [
        (smoking, weights.smoking),
        (sleep, weights.sleep),
        (cleanliness, weights.cleanliness),
        (age, weights.age),
        (noise, weights.noise),
        (pet, weights.pet),
        (lifestyle, weights.lifestyle),
    ]
    .iter()
    .map(|&(partial, weight)| u64::from(partial) * weight_units(weight))
    .sum::<u64>();

    cents_half_up(total) as f64 / 100.0
}

/// Round to two decimals, half-up.
#[inline]
pub fn round_score(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// 1.0 when both sides are known and equal.
#[inline]
pub fn boolean_score(preferred: Option<bool>, actual: Option<bool>) -> f64 {
    f64::from(boolean_units(preferred, actual)) / f64::from(PARTIAL_UNITS)
}

/// `1 - |preferred - actual| / 4` on the 1-5 scale; 0.0 when either side is unknown.
#[inline]
pub fn ordinal_score(preferred: Option<u8>, actual: Option<u8>) -> f64 {
    f64::from(ordinal_units(preferred, actual)) / f64::from(PARTIAL_UNITS)
}

#[inline]
fn boolean_units(preferred: Option<bool>, actual: Option<bool>) -> u32 {
    match (preferred, actual) {
        (Some(p), Some(a)) if p == a => PARTIAL_UNITS,
        _ => 0,
    }
}

#[inline]
fn ordinal_units(preferred: Option<u8>, actual: Option<u8>) -> u32 {
    match (preferred, actual) {
        (Some(p), Some(a)) => {
            let gap = u32::from(p.abs_diff(a)).min(SCALE_RANGE);
            PARTIAL_UNITS - gap * (PARTIAL_UNITS / SCALE_RANGE)
        }
        _ => 0,
    }
}

#[inline]
fn age_units(preferred_band: Option<u8>, birth_date: NaiveDate, today: NaiveDate) -> u32 {
    match age_band(calculate_age(birth_date, today)) {
        Some(band) => ordinal_units(preferred_band, Some(band)),
        None => 0,
    }
}

#[inline]
fn weight_units(weight: f64) -> u64 {
    (weight.max(0.0) * WEIGHT_UNITS).round() as u64
}

/// Convert a total in eighths times basis points to whole cents, half-up,
/// capped at 1.00.
#[inline]
fn cents_half_up(total: u64) -> u64 {
    let per_cent = u64::from(PARTIAL_UNITS) * WEIGHT_UNITS as u64 / 100;
    ((total + per_cent / 2) / per_cent).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn create_test_profile(age_years: i32) -> CandidateProfile {
        CandidateProfile {
            user_id: 2,
            name: "Candidate".to_string(),
            email: "candidate@uni.ac.kr".to_string(),
            gender: Gender::Female,
            university: "Seoul National University".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2025 - age_years, 1, 1).unwrap(),
            start_use_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_use_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            sleep_time: 4,
            cleaning_frequency: 3,
            hygiene_level: 3,
            noise_sensitivity: 2,
            drinking_frequency: 2,
            guest_frequency: 1,
            is_smoker: false,
            is_pet_allowed: true,
            is_snoring: false,
            mbti: "INTJ".to_string(),
            student_verified: true,
            matching_enabled: true,
        }
    }

    fn matching_preferences(profile: &CandidateProfile, band: u8) -> PreferenceVector {
        PreferenceVector {
            user_id: 1,
            sleep_time: Some(profile.sleep_time),
            cleaning_frequency: Some(profile.cleaning_frequency),
            hygiene_level: Some(profile.hygiene_level),
            noise_sensitivity: Some(profile.noise_sensitivity),
            drinking_frequency: Some(profile.drinking_frequency),
            guest_frequency: Some(profile.guest_frequency),
            is_smoker: Some(profile.is_smoker),
            is_pet_allowed: Some(profile.is_pet_allowed),
            is_snoring: Some(profile.is_snoring),
            preferred_age_gap: Some(band),
        }
    }

    #[test]
    fn test_identical_preferences_score_one() {
        let profile = create_test_profile(24);
        let prefs = matching_preferences(&profile, 2);
        let score = calculate_compatibility(Some(&prefs), Some(&profile), &ScoringWeights::default(), today());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_missing_arguments_score_zero() {
        let profile = create_test_profile(24);
        let prefs = matching_preferences(&profile, 2);
        let weights = ScoringWeights::default();
        assert_eq!(calculate_compatibility(None, Some(&profile), &weights, today()), 0.0);
        assert_eq!(calculate_compatibility(Some(&prefs), None, &weights, today()), 0.0);
    }

    #[test]
    fn test_empty_preferences_score_zero() {
        let profile = create_test_profile(24);
        let prefs = PreferenceVector { user_id: 1, ..Default::default() };
        let score = calculate_compatibility(Some(&prefs), Some(&profile), &ScoringWeights::default(), today());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_ordinal_score() {
        assert_eq!(ordinal_score(Some(4), Some(4)), 1.0);
        assert_eq!(ordinal_score(Some(5), Some(1)), 0.0);
        assert_eq!(ordinal_score(Some(3), Some(2)), 0.75);
        assert_eq!(ordinal_score(None, Some(2)), 0.0);
        assert_eq!(ordinal_score(Some(3), None), 0.0);
    }

    #[test]
    fn test_boolean_score() {
        assert_eq!(boolean_score(Some(true), Some(true)), 1.0);
        assert_eq!(boolean_score(Some(true), Some(false)), 0.0);
        assert_eq!(boolean_score(None, Some(false)), 0.0);
    }

    #[test]
    fn test_age_outside_bands_scores_zero() {
        let profile = create_test_profile(18);
        let only_age = PreferenceVector {
            user_id: 1,
            preferred_age_gap: Some(1),
            ..Default::default()
        };
        let score = calculate_compatibility(Some(&only_age), Some(&profile), &ScoringWeights::default(), today());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_age_band_distance() {
        // 27 years old is band 3, preference band 1: 1 - 2/4 = 0.5, weighted 0.10
        let profile = create_test_profile(27);
        let only_age = PreferenceVector {
            user_id: 1,
            preferred_age_gap: Some(1),
            ..Default::default()
        };
        let score = calculate_compatibility(Some(&only_age), Some(&profile), &ScoringWeights::default(), today());
        assert_eq!(score, 0.05);
    }

    #[test]
    fn test_composite_halves() {
        // Only snoring known and equal: noise = (0 + 1) / 2 = 0.5, weighted 0.10
        let profile = create_test_profile(24);
        let prefs = PreferenceVector {
            user_id: 1,
            is_snoring: Some(false),
            ..Default::default()
        };
        let score = calculate_compatibility(Some(&prefs), Some(&profile), &ScoringWeights::default(), today());
        assert_eq!(score, 0.05);
    }

    #[test]
    fn test_half_cent_totals_round_up() {
        // 0.20 smoking + 0.0375 noise + 0.0375 lifestyle + 0.05 age = 0.325
        let profile = create_test_profile(24);
        let prefs = PreferenceVector {
            user_id: 1,
            is_smoker: Some(false),
            noise_sensitivity: Some(3),
            drinking_frequency: Some(1),
            preferred_age_gap: Some(4),
            ..Default::default()
        };
        let score = calculate_compatibility(Some(&prefs), Some(&profile), &ScoringWeights::default(), today());
        assert_eq!(score, 0.33);

        // 0.0375 alone lands on 0.04
        let noise_only = PreferenceVector {
            user_id: 1,
            noise_sensitivity: Some(1),
            ..Default::default()
        };
        let score = calculate_compatibility(Some(&noise_only), Some(&profile), &ScoringWeights::default(), today());
        assert_eq!(score, 0.04);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_score(0.125), 0.13);
        assert_eq!(round_score(0.874), 0.87);
        assert_eq!(round_score(0.0), 0.0);
    }
}
