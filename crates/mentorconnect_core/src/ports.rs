//! crates/mentorconnect_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or mailboxes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    Feedback, Identity, MentorProfile, NewFeedback, NewMentorProfile, NewSession, Notification,
    PageRequest, Role, Session, SessionFilter, SessionStatus, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port and by the core service.
///
/// Each variant is surfaced to the caller directly; none of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// Missing or malformed input, or an operation attempted in the wrong status.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Wrong role, or a caller who is not a participant.
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users & Auth ---
    /// Creates the user and, when `profile` is given, its mentor profile.
    /// Both rows are written or neither is.
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        hashed_password: &str,
        profile: Option<&NewMentorProfile>,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live auth session to the caller's identity.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Identity>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Mentor Profiles ---
    async fn get_mentor_profile(&self, mentor_id: Uuid) -> PortResult<MentorProfile>;

    async fn set_mentor_rating(&self, mentor_id: Uuid, rating: f64) -> PortResult<()>;

    async fn increment_mentor_sessions(&self, mentor_id: Uuid) -> PortResult<()>;

    // --- Mentorship Sessions ---
    /// Persists a pending session. Fails with `Conflict` when the mentor already
    /// has a pending or confirmed session starting at the same date and time.
    async fn insert_session(&self, new_session: NewSession) -> PortResult<Session>;

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session>;

    async fn sessions_for_mentor_on(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<Session>>;

    /// Returns one page of sessions plus the total number of matches.
    async fn list_sessions(&self, filter: &SessionFilter) -> PortResult<(Vec<Session>, u64)>;

    async fn sessions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Session>>;

    /// Compare-and-swap on the status column. Fails with `Conflict` when the
    /// stored status is no longer `from`.
    async fn update_session_status(
        &self,
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> PortResult<Session>;

    async fn set_meeting_link(&self, session_id: Uuid, link: &str) -> PortResult<Session>;

    /// Writes the inline rating once. Fails with `Conflict` if one is already set.
    async fn set_session_rating(
        &self,
        session_id: Uuid,
        rating: i16,
        feedback: Option<&str>,
    ) -> PortResult<Session>;

    // --- Feedback ---
    /// Fails with `Conflict` if the session already has feedback.
    async fn insert_feedback(&self, new_feedback: NewFeedback) -> PortResult<Feedback>;

    async fn get_feedback(&self, feedback_id: Uuid) -> PortResult<Feedback>;

    async fn get_feedback_for_session(&self, session_id: Uuid) -> PortResult<Option<Feedback>>;

    async fn update_feedback(&self, feedback: &Feedback) -> PortResult<Feedback>;

    async fn delete_feedback(&self, feedback_id: Uuid) -> PortResult<()>;

    async fn feedback_for_mentor(&self, mentor_id: Uuid) -> PortResult<Vec<Feedback>>;

    async fn list_public_feedback(
        &self,
        mentor_id: Uuid,
        min_rating: Option<i16>,
        page: PageRequest,
    ) -> PortResult<(Vec<Feedback>, u64)>;

    async fn reviewed_session_ids(&self, student_id: Uuid) -> PortResult<Vec<Uuid>>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Hands an event to the mailbox. Delivery happens elsewhere.
    async fn notify(&self, notification: &Notification) -> PortResult<()>;
}
