//! Dual-response lifecycle of a match, as a pure transition function.
//!
//! ```text
//! Like ──(first response)──▶ Request{pending, pending}
//! Request ──accept/reject──▶ Request | Accepted | Rejected
//! ```
//!
//! Any rejection is immediately terminal. Both acceptances are terminal.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{MatchRecord, MatchResponse, MatchStatus, MatchType, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    fn as_response(self) -> MatchResponse {
        match self {
            Decision::Accept => MatchResponse::Accepted,
            Decision::Reject => MatchResponse::Rejected,
        }
    }
}

/// Both participants' answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Responses {
    pub sender: MatchResponse,
    pub receiver: MatchResponse,
}

impl Responses {
    pub const PENDING: Responses = Responses {
        sender: MatchResponse::Pending,
        receiver: MatchResponse::Pending,
    };

    pub fn of(&self, role: Role) -> MatchResponse {
        match role {
            Role::Sender => self.sender,
            Role::Receiver => self.receiver,
        }
    }

    fn with(mut self, role: Role, response: MatchResponse) -> Self {
        match role {
            Role::Sender => self.sender = response,
            Role::Receiver => self.receiver = response,
        }
        self
    }
}

/// Tagged lifecycle state of a match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// One-directional interest.
    Liked,
    /// Mutual interest awaiting both confirmations.
    Requested(Responses),
    Accepted(Responses),
    Rejected(Responses),
}

impl MatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchState::Accepted(_) | MatchState::Rejected(_))
    }

    pub fn match_type(&self) -> MatchType {
        match self {
            MatchState::Liked => MatchType::Like,
            _ => MatchType::Request,
        }
    }

    pub fn status(&self) -> MatchStatus {
        match self {
            MatchState::Liked | MatchState::Requested(_) => MatchStatus::Pending,
            MatchState::Accepted(_) => MatchStatus::Accepted,
            MatchState::Rejected(_) => MatchStatus::Rejected,
        }
    }

    pub fn responses(&self) -> Responses {
        match self {
            MatchState::Liked => Responses::PENDING,
            MatchState::Requested(r) | MatchState::Accepted(r) | MatchState::Rejected(r) => *r,
        }
    }

    /// Derive the state from a stored record.
    pub fn of_record(record: &MatchRecord) -> Result<Self, TransitionError> {
        let responses = Responses {
            sender: record.sender_response,
            receiver: record.receiver_response,
        };

        match (record.match_type, record.match_status) {
            (MatchType::Like, _) => Ok(MatchState::Liked),
            (MatchType::Request, MatchStatus::Accepted) => Ok(MatchState::Accepted(responses)),
            (MatchType::Request, MatchStatus::Rejected) => Ok(MatchState::Rejected(responses)),
            (MatchType::Request, _) => Ok(MatchState::Requested(responses)),
            (MatchType::None, _) => Err(TransitionError::NotARequest),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("only a roommate request can be confirmed or rejected")]
    NotARequest,

    #[error("you have already responded to this match")]
    AlreadyResponded,

    #[error("this match has already been concluded")]
    Concluded,
}

/// Apply one participant's decision.
///
/// A LIKE reaching this point is first upgraded to a pending request: other
/// flows guarantee mutuality before confirmation is offered.
pub fn transition(state: MatchState, actor: Role, decision: Decision) -> Result<MatchState, TransitionError> {
    let responses = match state {
        MatchState::Liked => Responses::PENDING,
        other => other.responses(),
    };

    if responses.of(actor) != MatchResponse::Pending {
        return Err(TransitionError::AlreadyResponded);
    }

    if state.is_terminal() {
        return Err(TransitionError::Concluded);
    }

    let responses = responses.with(actor, decision.as_response());

    Ok(resolve(responses))
}

fn resolve(responses: Responses) -> MatchState {
    use MatchResponse::*;

    match (responses.sender, responses.receiver) {
        (Rejected, _) | (_, Rejected) => MatchState::Rejected(responses),
        (Accepted, Accepted) => MatchState::Accepted(responses),
        _ => MatchState::Requested(responses),
    }
}

/// Write a state back onto a record; stamps `confirmed_at` on full acceptance.
pub fn apply_state(record: &mut MatchRecord, state: MatchState, now: DateTime<Utc>) {
    let responses = state.responses();

    record.match_type = state.match_type();
    record.match_status = state.status();
    record.sender_response = responses.sender;
    record.receiver_response = responses.receiver;
    record.updated_at = now;

    if matches!(state, MatchState::Accepted(_)) && record.confirmed_at.is_none() {
        record.confirmed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMatchRecord;

    fn requested() -> MatchState {
        MatchState::Requested(Responses::PENDING)
    }

    #[test]
    fn test_both_accept() {
        let state = transition(requested(), Role::Sender, Decision::Accept).unwrap();
        assert_eq!(state.status(), MatchStatus::Pending);

        let state = transition(state, Role::Receiver, Decision::Accept).unwrap();
        assert!(matches!(state, MatchState::Accepted(_)));
    }

    #[test]
    fn test_reject_after_accept_is_rejected() {
        let state = transition(requested(), Role::Sender, Decision::Accept).unwrap();
        let state = transition(state, Role::Receiver, Decision::Reject).unwrap();
        assert_eq!(state.status(), MatchStatus::Rejected);
        assert_eq!(state.responses().sender, MatchResponse::Accepted);
    }

    #[test]
    fn test_single_reject_is_terminal() {
        let state = transition(requested(), Role::Receiver, Decision::Reject).unwrap();
        assert!(state.is_terminal());
        assert_eq!(
            transition(state, Role::Sender, Decision::Accept),
            Err(TransitionError::Concluded)
        );
    }

    #[test]
    fn test_second_response_conflicts() {
        let state = transition(requested(), Role::Sender, Decision::Accept).unwrap();
        assert_eq!(
            transition(state, Role::Sender, Decision::Reject),
            Err(TransitionError::AlreadyResponded)
        );

        let accepted = transition(state, Role::Receiver, Decision::Accept).unwrap();
        assert_eq!(
            transition(accepted, Role::Receiver, Decision::Accept),
            Err(TransitionError::AlreadyResponded)
        );
    }

    #[test]
    fn test_like_is_upgraded_implicitly() {
        let state = transition(MatchState::Liked, Role::Receiver, Decision::Accept).unwrap();
        assert_eq!(state.match_type(), MatchType::Request);
        assert_eq!(state.responses().receiver, MatchResponse::Accepted);
        assert_eq!(state.responses().sender, MatchResponse::Pending);
    }

    #[test]
    fn test_none_type_is_invalid() {
        let mut record = NewMatchRecord::like(1, 2, 0.5).into_record(1);
        record.match_type = MatchType::None;
        assert_eq!(MatchState::of_record(&record), Err(TransitionError::NotARequest));
    }

    #[test]
    fn test_apply_state_stamps_confirmation_only_on_accept() {
        let now = Utc::now();
        let mut record = NewMatchRecord::like(1, 2, 0.5).into_record(1);

        let rejected = transition(MatchState::Liked, Role::Sender, Decision::Reject).unwrap();
        apply_state(&mut record, rejected, now);
        assert_eq!(record.match_status, MatchStatus::Rejected);
        assert_eq!(record.confirmed_at, None);

        let mut record = NewMatchRecord::like(1, 2, 0.5).into_record(2);
        let state = transition(MatchState::Liked, Role::Sender, Decision::Accept).unwrap();
        let state = transition(state, Role::Receiver, Decision::Accept).unwrap();
        apply_state(&mut record, state, now);
        assert_eq!(record.match_type, MatchType::Request);
        assert_eq!(record.match_status, MatchStatus::Accepted);
        assert_eq!(record.confirmed_at, Some(now));
    }
}
