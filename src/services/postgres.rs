use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::time::Duration;

use crate::models::{
    CandidateProfile, MatchId, MatchRecord, NewMatchRecord, PreferenceVector, UserId,
};
use crate::services::{PreferenceStore, ProfileStore, RelationshipStore, ReviewService, StoreError};

const PROFILE_COLUMNS: &str = r#"
    u.id AS user_id, u.name, u.email, u.gender, u.birth_date, u.university, u.student_verified,
    p.sleep_time, p.cleaning_frequency, p.hygiene_level, p.noise_sensitivity,
    p.drinking_frequency, p.guest_frequency, p.is_smoker, p.is_pet_allowed, p.is_snoring,
    p.mbti, p.start_use_date, p.end_use_date, p.matching_enabled
"#;

const MATCH_COLUMNS: &str = r#"
    id, sender_id, receiver_id, match_type, match_status, sender_response, receiver_response,
    preference_score, created_at, updated_at, confirmed_at, rematch_round, version
"#;

/// PostgreSQL-backed implementation of the profile, preference, relationship
/// and review ports.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    async fn review_flags(&self, record: &MatchRecord) -> Result<Vec<(UserId, bool)>, StoreError> {
        let rows = sqlx::query(
            "SELECT reviewer_id, can_rematch FROM reviews WHERE match_id = $1 AND reviewer_id IN ($2, $3)",
        )
        .bind(record.id)
        .bind(record.sender_id)
        .bind(record.receiver_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(UserId, bool), StoreError> {
                Ok((row.try_get("reviewer_id")?, row.try_get("can_rematch")?))
            })
            .collect()
    }
}

fn rating(row: &PgRow, column: &str) -> Result<u8, StoreError> {
    let value: i16 = row.try_get(column)?;
    u8::try_from(value).map_err(|_| StoreError::InvalidData(format!("{} out of range: {}", column, value)))
}

fn optional_rating(row: &PgRow, column: &str) -> Result<Option<u8>, StoreError> {
    let value: Option<i16> = row.try_get(column)?;
    value
        .map(|v| u8::try_from(v).map_err(|_| StoreError::InvalidData(format!("{} out of range: {}", column, v))))
        .transpose()
}

fn parse_text<T: std::str::FromStr<Err = String>>(row: &PgRow, column: &str) -> Result<T, StoreError> {
    let value: String = row.try_get(column)?;
    value.parse().map_err(StoreError::InvalidData)
}

fn profile_from_row(row: &PgRow) -> Result<CandidateProfile, StoreError> {
    Ok(CandidateProfile {
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        gender: parse_text(row, "gender")?,
        university: row.try_get("university")?,
        birth_date: row.try_get("birth_date")?,
        start_use_date: row.try_get("start_use_date")?,
        end_use_date: row.try_get("end_use_date")?,
        sleep_time: rating(row, "sleep_time")?,
        cleaning_frequency: rating(row, "cleaning_frequency")?,
        hygiene_level: rating(row, "hygiene_level")?,
        noise_sensitivity: rating(row, "noise_sensitivity")?,
        drinking_frequency: rating(row, "drinking_frequency")?,
        guest_frequency: rating(row, "guest_frequency")?,
        is_smoker: row.try_get("is_smoker")?,
        is_pet_allowed: row.try_get("is_pet_allowed")?,
        is_snoring: row.try_get("is_snoring")?,
        mbti: row.try_get("mbti")?,
        student_verified: row.try_get("student_verified")?,
        matching_enabled: row.try_get("matching_enabled")?,
    })
}

fn preference_from_row(row: &PgRow) -> Result<PreferenceVector, StoreError> {
    Ok(PreferenceVector {
        user_id: row.try_get("user_id")?,
        sleep_time: optional_rating(row, "sleep_time")?,
        cleaning_frequency: optional_rating(row, "cleaning_frequency")?,
        hygiene_level: optional_rating(row, "hygiene_level")?,
        noise_sensitivity: optional_rating(row, "noise_sensitivity")?,
        drinking_frequency: optional_rating(row, "drinking_frequency")?,
        guest_frequency: optional_rating(row, "guest_frequency")?,
        is_smoker: row.try_get("is_smoker")?,
        is_pet_allowed: row.try_get("is_pet_allowed")?,
        is_snoring: row.try_get("is_snoring")?,
        preferred_age_gap: optional_rating(row, "preferred_age_gap")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchRecord, StoreError> {
    let rematch_round: i32 = row.try_get("rematch_round")?;

    Ok(MatchRecord {
        id: row.try_get("id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        match_type: parse_text(row, "match_type")?,
        match_status: parse_text(row, "match_status")?,
        sender_response: parse_text(row, "sender_response")?,
        receiver_response: parse_text(row, "receiver_response")?,
        preference_score: row.try_get("preference_score")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        confirmed_at: row.try_get("confirmed_at")?,
        rematch_round: u32::try_from(rematch_round)
            .map_err(|_| StoreError::InvalidData(format!("negative rematch round: {}", rematch_round)))?,
        version: row.try_get("version")?,
    })
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn list_all_profiles(&self) -> Result<Vec<CandidateProfile>, StoreError> {
        let query = format!(
            "SELECT {} FROM user_profiles p JOIN users u ON u.id = p.user_id",
            PROFILE_COLUMNS
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(profile_from_row).collect()
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<CandidateProfile>, StoreError> {
        let query = format!(
            "SELECT {} FROM user_profiles p JOIN users u ON u.id = p.user_id WHERE u.id = $1",
            PROFILE_COLUMNS
        );

        let row = sqlx::query(&query).bind(user_id).fetch_optional(&self.pool).await?;
        row.as_ref().map(profile_from_row).transpose()
    }
}

#[async_trait]
impl PreferenceStore for PgStore {
    async fn get_preference(&self, user_id: UserId) -> Result<Option<PreferenceVector>, StoreError> {
        let row = sqlx::query("SELECT * FROM user_match_preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(preference_from_row).transpose()
    }

    async fn registered_user_ids(&self) -> Result<HashSet<UserId>, StoreError> {
        let rows = sqlx::query("SELECT user_id FROM user_match_preferences")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>("user_id").map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl RelationshipStore for PgStore {
    async fn create(&self, record: NewMatchRecord) -> Result<MatchRecord, StoreError> {
        let query = format!(
            r#"
            INSERT INTO matches (sender_id, receiver_id, match_type, match_status, sender_response,
                                 receiver_response, preference_score, created_at, updated_at, rematch_round)
            VALUES ($1, $2, $3, 'PENDING', 'PENDING', 'PENDING', $4, $5, $5, $6)
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );

        let result = sqlx::query(&query)
            .bind(record.sender_id)
            .bind(record.receiver_id)
            .bind(record.match_type.as_str())
            .bind(record.preference_score)
            .bind(record.created_at)
            .bind(record.rematch_round as i32)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => match_from_row(&row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Duplicate(
                "a match between these users already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Conditional update: only succeeds while `version` is unchanged.
    async fn save(&self, record: &MatchRecord) -> Result<MatchRecord, StoreError> {
        let query = format!(
            r#"
            UPDATE matches
            SET sender_id = $3, receiver_id = $4, match_type = $5, match_status = $6,
                sender_response = $7, receiver_response = $8, updated_at = $9,
                confirmed_at = $10, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(record.id)
            .bind(record.version)
            .bind(record.sender_id)
            .bind(record.receiver_id)
            .bind(record.match_type.as_str())
            .bind(record.match_status.as_str())
            .bind(record.sender_response.as_str())
            .bind(record.receiver_response.as_str())
            .bind(record.updated_at)
            .bind(record.confirmed_at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => match_from_row(&row),
            None => Err(StoreError::VersionConflict(record.id)),
        }
    }

    async fn delete(&self, id: MatchId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_pair(&self, sender_id: UserId, receiver_id: UserId) -> Result<Vec<MatchRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM matches WHERE sender_id = $1 AND receiver_id = $2 ORDER BY created_at DESC, id DESC",
            MATCH_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(sender_id)
            .bind(receiver_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(match_from_row).collect()
    }

    async fn find_by_id(&self, id: MatchId) -> Result<Option<MatchRecord>, StoreError> {
        let query = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn find_involving(&self, user_id: UserId) -> Result<Vec<MatchRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM matches WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at DESC, id DESC",
            MATCH_COLUMNS
        );

        let rows = sqlx::query(&query).bind(user_id).fetch_all(&self.pool).await?;

        tracing::debug!("User {} is involved in {} matches", user_id, rows.len());

        rows.iter().map(match_from_row).collect()
    }
}

#[async_trait]
impl ReviewService for PgStore {
    async fn has_both_reviews(&self, record: &MatchRecord) -> Result<bool, StoreError> {
        let flags = self.review_flags(record).await?;
        let reviewed = |user_id| flags.iter().any(|(reviewer, _)| *reviewer == user_id);
        Ok(reviewed(record.sender_id) && reviewed(record.receiver_id))
    }

    async fn both_consent_to_rematch(&self, record: &MatchRecord) -> Result<bool, StoreError> {
        let flags = self.review_flags(record).await?;
        let consents = |user_id| flags.iter().any(|(reviewer, ok)| *reviewer == user_id && *ok);
        Ok(consents(record.sender_id) && consents(record.receiver_id))
    }
}
