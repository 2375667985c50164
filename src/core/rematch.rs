use std::sync::Arc;

use crate::error::MatchError;
use crate::models::{MatchRecord, MatchStatus};
use crate::services::ReviewService;

/// Decides whether a concluded match may be reopened as a new round.
#[derive(Clone)]
pub struct RematchEligibility {
    reviews: Arc<dyn ReviewService>,
}

impl RematchEligibility {
    pub fn new(reviews: Arc<dyn ReviewService>) -> Self {
        Self { reviews }
    }

    /// Accepted, and not itself a rematch.
    pub fn can_rematch_basic(record: &MatchRecord) -> bool {
        record.match_status == MatchStatus::Accepted && !record.is_rematch()
    }

    /// Basic gate plus both reviews submitted and both consenting.
    pub async fn can_rematch_based_on_reviews(&self, record: &MatchRecord) -> Result<bool, MatchError> {
        if !Self::can_rematch_basic(record) {
            return Ok(false);
        }

        Ok(self.reviews.has_both_reviews(record).await?
            && self.reviews.both_consent_to_rematch(record).await?)
    }

    pub async fn can_rematch(&self, record: &MatchRecord, require_review: bool) -> Result<bool, MatchError> {
        if require_review {
            self.can_rematch_based_on_reviews(record).await
        } else {
            Ok(Self::can_rematch_basic(record))
        }
    }

    /// Validate a rematch and return the next round number.
    ///
    /// Rejections name the first failing condition, in order: status, round,
    /// missing review, review disagreement.
    pub async fn validate_and_get_next_round(
        &self,
        record: &MatchRecord,
        require_review: bool,
    ) -> Result<u32, MatchError> {
        if record.match_status != MatchStatus::Accepted {
            return Err(MatchError::bad_request("the match has not been accepted"));
        }

        if record.is_rematch() {
            return Err(MatchError::bad_request("this match has already been rematched"));
        }

        if require_review {
            if !self.reviews.has_both_reviews(record).await? {
                return Err(MatchError::bad_request("both participants must submit a review first"));
            }

            if !self.reviews.both_consent_to_rematch(record).await? {
                return Err(MatchError::bad_request("both participants must agree to a rematch"));
            }
        }

        Ok(record.rematch_round + 1)
    }
}
