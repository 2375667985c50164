use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = i64;
pub type MatchId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// Read-optimized snapshot of one user's matching-relevant attributes.
///
/// Ordinal ratings are on a 1-5 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub user_id: UserId,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub email: String,
    pub gender: Gender,
    pub university: String,
    pub birth_date: NaiveDate,
    pub start_use_date: NaiveDate,
    pub end_use_date: NaiveDate,
    pub sleep_time: u8,
    pub cleaning_frequency: u8,
    pub hygiene_level: u8,
    pub noise_sensitivity: u8,
    pub drinking_frequency: u8,
    pub guest_frequency: u8,
    pub is_smoker: bool,
    pub is_pet_allowed: bool,
    pub is_snoring: bool,
    pub mbti: String,
    pub student_verified: bool,
    pub matching_enabled: bool,
}

/// Desired values for the same attributes. `None` means "no opinion".
///
/// `preferred_age_gap` is an age band index (1-5), not a number of years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceVector {
    pub user_id: UserId,
    #[serde(default)]
    pub sleep_time: Option<u8>,
    #[serde(default)]
    pub cleaning_frequency: Option<u8>,
    #[serde(default)]
    pub hygiene_level: Option<u8>,
    #[serde(default)]
    pub noise_sensitivity: Option<u8>,
    #[serde(default)]
    pub drinking_frequency: Option<u8>,
    #[serde(default)]
    pub guest_frequency: Option<u8>,
    #[serde(default)]
    pub is_smoker: Option<bool>,
    #[serde(default)]
    pub is_pet_allowed: Option<bool>,
    #[serde(default)]
    pub is_snoring: Option<bool>,
    #[serde(default)]
    pub preferred_age_gap: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    None,
    Like,
    Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    None,
    Pending,
    Accepted,
    Rejected,
}

/// One participant's answer to a match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchResponse {
    Pending,
    Accepted,
    Rejected,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($ty), other)),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(MatchType { None => "NONE", Like => "LIKE", Request => "REQUEST" });
text_enum!(MatchStatus {
    None => "NONE",
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
});
text_enum!(MatchResponse {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
});

/// Which side of a [`MatchRecord`] a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

/// Relationship between two users.
///
/// A LIKE that becomes mutual is upgraded in place (roles reassigned to the
/// user who completed it), never duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub match_type: MatchType,
    pub match_status: MatchStatus,
    pub sender_response: MatchResponse,
    pub receiver_response: MatchResponse,
    pub preference_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub rematch_round: u32,
    /// Optimistic concurrency counter, bumped on every save.
    pub version: i64,
}

impl MatchRecord {
    pub fn role_of(&self, user_id: UserId) -> Option<Role> {
        if self.sender_id == user_id {
            Some(Role::Sender)
        } else if self.receiver_id == user_id {
            Some(Role::Receiver)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.role_of(user_id).is_some()
    }

    pub fn partner_of(&self, user_id: UserId) -> UserId {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn response_of(&self, role: Role) -> MatchResponse {
        match role {
            Role::Sender => self.sender_response,
            Role::Receiver => self.receiver_response,
        }
    }

    /// Whether the record connects `a` and `b`, in either direction.
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    pub fn is_rematch(&self) -> bool {
        self.rematch_round > 0
    }
}

/// Fields needed to insert a record; the store assigns id and version.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatchRecord {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub match_type: MatchType,
    pub preference_score: f64,
    pub rematch_round: u32,
    pub created_at: DateTime<Utc>,
}

impl NewMatchRecord {
    pub fn like(sender_id: UserId, receiver_id: UserId, preference_score: f64) -> Self {
        Self {
            sender_id,
            receiver_id,
            match_type: MatchType::Like,
            preference_score,
            rematch_round: 0,
            created_at: Utc::now(),
        }
    }

    pub fn rematch(
        sender_id: UserId,
        receiver_id: UserId,
        preference_score: f64,
        rematch_round: u32,
    ) -> Self {
        Self {
            sender_id,
            receiver_id,
            match_type: MatchType::Request,
            preference_score,
            rematch_round,
            created_at: Utc::now(),
        }
    }

    /// Materialize with store-assigned id. New records are always PENDING.
    pub fn into_record(self, id: MatchId) -> MatchRecord {
        MatchRecord {
            id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            match_type: self.match_type,
            match_status: MatchStatus::Pending,
            sender_response: MatchResponse::Pending,
            receiver_response: MatchResponse::Pending,
            preference_score: self.preference_score,
            created_at: self.created_at,
            updated_at: self.created_at,
            confirmed_at: None,
            rematch_round: self.rematch_round,
            version: 0,
        }
    }
}

/// Scoring weights, summing to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub smoking: f64,
    pub sleep: f64,
    pub cleanliness: f64,
    pub age: f64,
    pub noise: f64,
    pub pet: f64,
    pub lifestyle: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.smoking + self.sleep + self.cleanliness + self.age + self.noise + self.pet + self.lifestyle
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            smoking: 0.20,
            sleep: 0.20,
            cleanliness: 0.20,
            age: 0.10,
            noise: 0.10,
            pet: 0.10,
            lifestyle: 0.10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sender: UserId, receiver: UserId) -> MatchRecord {
        NewMatchRecord::like(sender, receiver, 0.5).into_record(1)
    }

    #[test]
    fn test_roles() {
        let r = record(1, 2);
        assert_eq!(r.role_of(1), Some(Role::Sender));
        assert_eq!(r.role_of(2), Some(Role::Receiver));
        assert_eq!(r.role_of(3), None);
        assert_eq!(r.partner_of(2), 1);
        assert!(r.connects(2, 1));
        assert!(!r.connects(1, 3));
    }

    #[test]
    fn test_text_enums() {
        assert_eq!("REQUEST".parse::<MatchType>(), Ok(MatchType::Request));
        assert_eq!(MatchStatus::Accepted.as_str(), "ACCEPTED");
        assert!("accepted".parse::<MatchResponse>().is_err());
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().total() - 1.0).abs() < 1e-9);
    }
}
