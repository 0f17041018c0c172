//! crates/mentorconnect_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ports::PortError;

/// Lowest and highest rating a student may give.
pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

//=========================================================================================
// Users & Identity
//=========================================================================================

/// The role a user holds on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Mentor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            "admin" => Ok(Role::Admin),
            other => Err(PortError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// The verified caller of a request, supplied by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub hashed_password: String,
}

/// Profile fields captured when a mentor signs up.
#[derive(Debug, Clone, Default)]
pub struct NewMentorProfile {
    pub bio: Option<String>,
    pub hourly_rate: Option<f64>,
}

/// Denormalized mentor view read by discovery. The core only writes
/// `rating` and `total_sessions`.
#[derive(Debug, Clone, PartialEq)]
pub struct MentorProfile {
    pub user_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub hourly_rate: Option<f64>,
    pub rating: f64,
    pub total_sessions: i64,
}

//=========================================================================================
// Sessions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed sessions hold their slot.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Pending | SessionStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "confirmed" => Ok(SessionStatus::Confirmed),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(PortError::Validation(format!(
                "Invalid session status '{other}'"
            ))),
        }
    }
}

/// One booked mentorship meeting between a student and a mentor.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub student_id: Uuid,
    pub mentor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: SessionStatus,
    pub topic: String,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.student_id == user_id || self.mentor_id == user_id
    }

    /// The other side of the session, if `user_id` is a participant.
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.student_id {
            Some(self.mentor_id)
        } else if user_id == self.mentor_id {
            Some(self.student_id)
        } else {
            None
        }
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.end_time).and_utc()
    }
}

/// A validated booking, ready to be persisted as a pending session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub student_id: Uuid,
    pub mentor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub topic: String,
    pub notes: Option<String>,
}

/// Which side of a session a listing is filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Student,
    Mentor,
    Either,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSort {
    Date,
    CreatedAt,
    Status,
}

impl FromStr for SessionSort {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SessionSort::Date),
            "createdAt" | "created_at" => Ok(SessionSort::CreatedAt),
            "status" => Ok(SessionSort::Status),
            other => Err(PortError::Validation(format!("Cannot sort by '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(PortError::Validation(format!("Invalid sort order '{other}'"))),
        }
    }
}

/// Page request, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 50;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Filter for a user's own session listing.
#[derive(Debug, Clone)]
pub struct SessionFilter {
    pub user_id: Uuid,
    pub side: ParticipantRole,
    pub status: Option<SessionStatus>,
    pub sort: SessionSort,
    pub order: SortOrder,
    pub page: PageRequest,
}

//=========================================================================================
// Feedback
//=========================================================================================

/// Optional sub-ratings, each 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryRatings {
    pub communication: Option<i16>,
    pub knowledge: Option<i16>,
    pub helpfulness: Option<i16>,
    pub professionalism: Option<i16>,
}

impl CategoryRatings {
    pub fn is_empty(&self) -> bool {
        self.communication.is_none()
            && self.knowledge.is_none()
            && self.helpfulness.is_none()
            && self.professionalism.is_none()
    }
}

/// A structured post-session review.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub mentor_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub categories: CategoryRatings,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub mentor_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub categories: CategoryRatings,
    pub is_public: bool,
}

/// Partial edit of a feedback by its author.
#[derive(Debug, Clone, Default)]
pub struct FeedbackUpdate {
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub categories: Option<CategoryRatings>,
    pub is_public: Option<bool>,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    SessionBooked,
    SessionConfirmed,
    SessionCancelled,
    ReviewReminder,
    FeedbackReceived,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::SessionBooked => "sessionBooked",
            NotificationKind::SessionConfirmed => "sessionConfirmed",
            NotificationKind::SessionCancelled => "sessionCancelled",
            NotificationKind::ReviewReminder => "reviewReminder",
            NotificationKind::FeedbackReceived => "feedbackReceived",
        }
    }
}

/// An event handed to the mailbox for asynchronous delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub session_id: Uuid,
    pub message: String,
}
