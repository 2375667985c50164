use chrono::NaiveDate;
use std::collections::HashSet;
use std::str::FromStr;

use crate::core::age::calculate_age;
use crate::error::MatchError;
use crate::models::{CandidateProfile, Gender, UserId};

/// Sleep pattern filter, mapped onto the 1-5 sleep-time rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepPattern {
    VeryEarly,
    Early,
    Normal,
    Late,
    VeryLate,
}

impl SleepPattern {
    pub fn rating(&self) -> u8 {
        match self {
            SleepPattern::VeryEarly => 5,
            SleepPattern::Early => 4,
            SleepPattern::Normal => 3,
            SleepPattern::Late => 2,
            SleepPattern::VeryLate => 1,
        }
    }
}

impl FromStr for SleepPattern {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "very_early" => Ok(SleepPattern::VeryEarly),
            "early" => Ok(SleepPattern::Early),
            "normal" => Ok(SleepPattern::Normal),
            "late" => Ok(SleepPattern::Late),
            "very_late" => Ok(SleepPattern::VeryLate),
            other => Err(MatchError::bad_request(format!(
                "invalid sleep pattern filter '{}': expected very_early, early, normal, late or very_late",
                other
            ))),
        }
    }
}

/// Age range filter over the computed age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeRange {
    From20To22,
    From23To25,
    From26To28,
    From29To30,
    From31,
}

impl AgeRange {
    pub fn contains(&self, age: u32) -> bool {
        match self {
            AgeRange::From20To22 => (20..=22).contains(&age),
            AgeRange::From23To25 => (23..=25).contains(&age),
            AgeRange::From26To28 => (26..=28).contains(&age),
            AgeRange::From29To30 => (29..=30).contains(&age),
            AgeRange::From31 => age >= 31,
        }
    }
}

impl FromStr for AgeRange {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "20-22" => Ok(AgeRange::From20To22),
            "23-25" => Ok(AgeRange::From23To25),
            "26-28" => Ok(AgeRange::From26To28),
            "29-30" => Ok(AgeRange::From29To30),
            "31+" => Ok(AgeRange::From31),
            other => Err(MatchError::bad_request(format!(
                "invalid age range filter '{}': expected 20-22, 23-25, 26-28, 29-30 or 31+",
                other
            ))),
        }
    }
}

/// Cleaning frequency filter, mapped onto the 1-5 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningFrequency {
    Daily,
    SeveralTimesWeekly,
    Weekly,
    Monthly,
    Rarely,
}

impl CleaningFrequency {
    pub fn rating(&self) -> u8 {
        match self {
            CleaningFrequency::Daily => 5,
            CleaningFrequency::SeveralTimesWeekly => 4,
            CleaningFrequency::Weekly => 3,
            CleaningFrequency::Monthly => 2,
            CleaningFrequency::Rarely => 1,
        }
    }
}

impl FromStr for CleaningFrequency {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(CleaningFrequency::Daily),
            "several_times_weekly" => Ok(CleaningFrequency::SeveralTimesWeekly),
            "weekly" => Ok(CleaningFrequency::Weekly),
            "monthly" => Ok(CleaningFrequency::Monthly),
            "rarely" => Ok(CleaningFrequency::Rarely),
            other => Err(MatchError::bad_request(format!(
                "invalid cleaning frequency filter '{}': expected daily, several_times_weekly, weekly, monthly or rarely",
                other
            ))),
        }
    }
}

/// Inclusive date range a candidate's habitation window must overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Optional user-supplied filters, already validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilters {
    pub sleep_pattern: Option<SleepPattern>,
    pub age_range: Option<AgeRange>,
    pub cleaning_frequency: Option<CleaningFrequency>,
    pub stay_window: Option<StayWindow>,
}

impl CandidateFilters {
    /// Parse raw filter values. Blank strings mean "no filter".
    ///
    /// A stay window is applied only when both dates are given.
    pub fn parse(
        sleep_pattern: Option<&str>,
        age_range: Option<&str>,
        cleaning_frequency: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, MatchError> {
        let stay_window = match (start_date, end_date) {
            (Some(start), Some(end)) if start > end => {
                return Err(MatchError::bad_request(format!(
                    "start date {} must not be after end date {}",
                    start, end
                )));
            }
            (Some(start), Some(end)) => Some(StayWindow { start, end }),
            _ => None,
        };

        Ok(Self {
            sleep_pattern: non_blank(sleep_pattern).map(str::parse).transpose()?,
            age_range: non_blank(age_range).map(str::parse).transpose()?,
            cleaning_frequency: non_blank(cleaning_frequency).map(str::parse).transpose()?,
            stay_window,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Identity of the user asking for recommendations.
#[derive(Debug, Clone, PartialEq)]
pub struct Requester {
    pub user_id: UserId,
    pub gender: Gender,
    pub university: String,
}

/// Relationship facts the pipeline needs, loaded once per request.
#[derive(Debug, Clone, Default)]
pub struct EligibilityContext {
    /// Users with a registered preference vector.
    pub registered: HashSet<UserId>,
    /// Users already in an active relationship with the requester.
    pub active_partners: HashSet<UserId>,
}

/// Mandatory eligibility checks (pipeline steps 1-6).
#[inline]
pub fn is_eligible(
    profile: &CandidateProfile,
    requester: &Requester,
    context: &EligibilityContext,
) -> bool {
    if profile.user_id == requester.user_id {
        return false;
    }

    if profile.gender != requester.gender || !profile.matching_enabled {
        return false;
    }

    if !context.registered.contains(&profile.user_id) {
        return false;
    }

    if profile.university != requester.university {
        return false;
    }

    !context.active_partners.contains(&profile.user_id)
}

/// Optional filters (pipeline steps 7-10).
#[inline]
pub fn matches_filters(profile: &CandidateProfile, filters: &CandidateFilters, today: NaiveDate) -> bool {
    if let Some(pattern) = filters.sleep_pattern {
        if profile.sleep_time != pattern.rating() {
            return false;
        }
    }

    if let Some(range) = filters.age_range {
        if !range.contains(calculate_age(profile.birth_date, today)) {
            return false;
        }
    }

    if let Some(frequency) = filters.cleaning_frequency {
        if profile.cleaning_frequency != frequency.rating() {
            return false;
        }
    }

    match filters.stay_window {
        Some(window) => overlaps_stay_window(profile, &window),
        None => true,
    }
}

/// Inclusive overlap of the candidate's habitation window with `window`.
#[inline]
pub fn overlaps_stay_window(profile: &CandidateProfile, window: &StayWindow) -> bool {
    !(profile.end_use_date < window.start || profile.start_use_date > window.end)
}
