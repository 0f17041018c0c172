//! crates/mentorconnect_core/src/lifecycle.rs
//!
//! The session status state machine and the rules for who may move a session
//! along it.
//!
//! ```text
//! pending ──► confirmed ──► completed
//!    │            │
//!    └──────┬─────┘
//!           ▼
//!       cancelled
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Identity, Session, SessionStatus};
use crate::ports::{PortError, PortResult};

/// Which participant of a session a user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Student,
    Mentor,
}

/// Who may trigger a given transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    MentorOnly,
    EitherParticipant,
}

impl Authority {
    fn permits(&self, side: Side) -> bool {
        match self {
            Authority::MentorOnly => side == Side::Mentor,
            Authority::EitherParticipant => true,
        }
    }
}

/// Returns the authority for `from -> to`, or `None` if the transition is illegal.
pub fn transition_authority(from: SessionStatus, to: SessionStatus) -> Option<Authority> {
    use SessionStatus::*;
    match (from, to) {
        (Pending, Confirmed) => Some(Authority::MentorOnly),
        (Pending, Cancelled) => Some(Authority::MentorOnly),
        (Confirmed, Completed) => Some(Authority::MentorOnly),
        (Confirmed, Cancelled) => Some(Authority::EitherParticipant),
        _ => None,
    }
}

pub fn can_transition(from: SessionStatus, to: SessionStatus) -> bool {
    transition_authority(from, to).is_some()
}

pub fn side_of(session: &Session, user_id: Uuid) -> Option<Side> {
    if session.mentor_id == user_id {
        Some(Side::Mentor)
    } else if session.student_id == user_id {
        Some(Side::Student)
    } else {
        None
    }
}

fn participant_side(session: &Session, actor: &Identity) -> PortResult<Side> {
    side_of(session, actor.user_id).ok_or_else(|| {
        PortError::Forbidden(format!(
            "User {} is not a participant of session {}",
            actor.user_id, session.id
        ))
    })
}

/// Checks that `actor` may move `session` to `target` through the status endpoint.
pub fn authorize_transition(
    session: &Session,
    actor: &Identity,
    target: SessionStatus,
) -> PortResult<()> {
    let side = participant_side(session, actor)?;

    let authority = transition_authority(session.status, target).ok_or_else(|| {
        PortError::Validation(format!(
            "Invalid transition: {} -> {}",
            session.status, target
        ))
    })?;

    if !authority.permits(side) {
        return Err(PortError::Forbidden(format!(
            "Only the mentor may move a session from {} to {}",
            session.status, target
        )));
    }
    Ok(())
}

/// The generic cancel: any participant, from any non-terminal status.
pub fn authorize_cancel(session: &Session, actor: &Identity) -> PortResult<()> {
    participant_side(session, actor)?;
    if !session.status.is_active() {
        return Err(PortError::Validation(format!(
            "Cannot cancel a {} session",
            session.status
        )));
    }
    Ok(())
}

/// Only the mentor sets the meeting link, and only while the session is live.
pub fn authorize_meeting_link(session: &Session, actor: &Identity) -> PortResult<()> {
    if participant_side(session, actor)? != Side::Mentor {
        return Err(PortError::Forbidden(
            "Only the mentor may set the meeting link".to_string(),
        ));
    }
    if session.status.is_terminal() {
        return Err(PortError::Validation(format!(
            "Cannot set a meeting link on a {} session",
            session.status
        )));
    }
    Ok(())
}

/// Checks that `actor` may leave a rating or feedback on `session`.
///
/// Authorization is checked before status so that outsiders learn nothing
/// about the session's state.
pub fn authorize_review(session: &Session, actor: &Identity) -> PortResult<()> {
    if session.student_id != actor.user_id {
        return Err(PortError::Forbidden(
            "Only the session's student may review it".to_string(),
        ));
    }
    if session.status != SessionStatus::Completed {
        return Err(PortError::Validation(format!(
            "Session must be completed before it can be reviewed (current status: {})",
            session.status
        )));
    }
    Ok(())
}

//=========================================================================================
// Review eligibility
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEligibility {
    /// Completed and not yet reviewed.
    Reviewable,
    /// Confirmed and already over; the mentor has to mark it complete first.
    AwaitingCompletion,
    AlreadyReviewed,
    NotReviewable,
}

impl ReviewEligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewEligibility::Reviewable => "reviewable",
            ReviewEligibility::AwaitingCompletion => "awaitingCompletion",
            ReviewEligibility::AlreadyReviewed => "alreadyReviewed",
            ReviewEligibility::NotReviewable => "notReviewable",
        }
    }

    /// Whether the session belongs on a pending-reviews dashboard.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            ReviewEligibility::Reviewable | ReviewEligibility::AwaitingCompletion
        )
    }
}

pub fn review_eligibility(
    session: &Session,
    has_feedback: bool,
    now: DateTime<Utc>,
) -> ReviewEligibility {
    match session.status {
        SessionStatus::Completed if has_feedback => ReviewEligibility::AlreadyReviewed,
        SessionStatus::Completed => ReviewEligibility::Reviewable,
        SessionStatus::Confirmed if session.ends_at() <= now => {
            ReviewEligibility::AwaitingCompletion
        }
        _ => ReviewEligibility::NotReviewable,
    }
}

pub fn is_reviewable(session: &Session, has_feedback: bool, now: DateTime<Utc>) -> bool {
    review_eligibility(session, has_feedback, now) == ReviewEligibility::Reviewable
}
