//! services/api/src/web/rest.rs
//!
//! Contains the shared REST response payloads and the master definition for
//! the OpenAPI specification.

use chrono::{DateTime, Utc};
use mentorconnect_core::domain::{CategoryRatings, Feedback, Pagination, Session};
use mentorconnect_core::slots;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{auth, feedback, mentors, sessions};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        sessions::book_session_handler,
        sessions::booked_slots_handler,
        sessions::availability_handler,
        sessions::my_sessions_handler,
        sessions::upcoming_sessions_handler,
        sessions::pending_reviews_handler,
        sessions::get_session_handler,
        sessions::update_status_handler,
        sessions::cancel_session_handler,
        sessions::meeting_link_handler,
        sessions::rate_session_handler,
        feedback::create_feedback_handler,
        feedback::mentor_feedback_handler,
        feedback::feedback_stats_handler,
        feedback::session_feedback_handler,
        feedback::update_feedback_handler,
        feedback::delete_feedback_handler,
        mentors::mentor_profile_handler,
    ),
    components(
        schemas(
            SessionResponse,
            FeedbackResponse,
            CategoriesPayload,
            PaginationResponse,
        )
    ),
    tags(
        (name = "MentorConnect API", description = "Session booking, lifecycle and mentor feedback.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Response Structs
//=========================================================================================

/// A session as returned by every session endpoint.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub mentor_id: Uuid,
    #[schema(example = "2025-06-10")]
    pub date: String,
    #[schema(example = "10:00")]
    pub start_time: String,
    #[schema(example = "11:00")]
    pub end_time: String,
    #[schema(example = "pending")]
    pub status: String,
    pub topic: String,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub rating: Option<i16>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            student_id: s.student_id,
            mentor_id: s.mentor_id,
            date: slots::format_date(s.date),
            start_time: slots::format_time(s.start_time),
            end_time: slots::format_time(s.end_time),
            status: s.status.as_str().to_string(),
            topic: s.topic,
            notes: s.notes,
            meeting_link: s.meeting_link,
            rating: s.rating,
            feedback: s.feedback,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Optional 1-5 sub-ratings; used both in requests and responses.
#[derive(Serialize, Deserialize, ToSchema, Default, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesPayload {
    pub communication: Option<i16>,
    pub knowledge: Option<i16>,
    pub helpfulness: Option<i16>,
    pub professionalism: Option<i16>,
}

impl From<CategoriesPayload> for CategoryRatings {
    fn from(c: CategoriesPayload) -> Self {
        Self {
            communication: c.communication,
            knowledge: c.knowledge,
            helpfulness: c.helpfulness,
            professionalism: c.professionalism,
        }
    }
}

impl From<CategoryRatings> for CategoriesPayload {
    fn from(c: CategoryRatings) -> Self {
        Self {
            communication: c.communication,
            knowledge: c.knowledge,
            helpfulness: c.helpfulness,
            professionalism: c.professionalism,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub mentor_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub categories: CategoriesPayload,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            session_id: f.session_id,
            student_id: f.student_id,
            mentor_id: f.mentor_id,
            rating: f.rating,
            comment: f.comment,
            categories: f.categories.into(),
            is_public: f.is_public,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            page: p.page,
            limit: p.limit,
            total: p.total,
            total_pages: p.total_pages,
        }
    }
}
