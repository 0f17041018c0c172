//! services/api/src/web/sessions.rs
//!
//! Axum handlers for booking sessions, checking availability and driving the
//! session lifecycle.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use mentorconnect_core::domain::{
    Identity, PageRequest, ParticipantRole, SessionSort, SessionStatus, SortOrder,
};
use mentorconnect_core::ports::PortError;
use mentorconnect_core::{slots, BookingRequest, MySessionsQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::rest::{PaginationResponse, SessionResponse};
use crate::web::state::AppState;

//=========================================================================================
// API Payload and Query Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSessionRequest {
    pub mentor_id: Uuid,
    #[schema(example = "2025-06-10")]
    pub date: String,
    #[schema(example = "10:00")]
    pub start_time: String,
    #[schema(example = "11:00")]
    pub end_time: String,
    pub topic: String,
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MySessionsParams {
    pub status: Option<String>,
    /// `student` or `mentor`; defaults to the caller's role.
    pub role: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `date`, `createdAt` or `status`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
}

impl MySessionsParams {
    fn into_query(self) -> Result<MySessionsQuery, PortError> {
        let side = match self.role.as_deref() {
            None => None,
            Some("student") => Some(ParticipantRole::Student),
            Some("mentor") => Some(ParticipantRole::Mentor),
            Some(other) => {
                return Err(PortError::Validation(format!(
                    "role must be student or mentor, got '{other}'"
                )))
            }
        };
        Ok(MySessionsQuery {
            status: self.status.as_deref().map(str::parse).transpose()?,
            side,
            sort: self
                .sort_by
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or(SessionSort::Date),
            order: self
                .order
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or(SortOrder::Desc),
            page: PageRequest::new(self.page, self.limit),
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "confirmed")]
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLinkRequest {
    pub meeting_link: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RateSessionRequest {
    pub rating: i16,
    pub feedback: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub start_time: String,
    pub end_time: String,
    pub available: bool,
}

#[derive(Serialize, ToSchema)]
pub struct PendingReviewResponse {
    pub session: SessionResponse,
    /// `reviewable` or `awaitingCompletion`.
    pub eligibility: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Request a one-hour session with a mentor.
#[utoipa::path(
    post,
    path = "/session/book",
    request_body = BookSessionRequest,
    responses(
        (status = 201, description = "Session requested", body = SessionResponse),
        (status = 400, description = "Invalid date, time, slot or topic"),
        (status = 403, description = "Caller is not a student"),
        (status = 404, description = "Mentor not found"),
        (status = 409, description = "Slot already booked")
    )
)]
pub async fn book_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<BookSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = BookingRequest {
        mentor_id: req.mentor_id,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
        topic: req.topic,
        notes: req.notes,
    };
    let session = state
        .mentorship
        .book_session(&identity, request, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

/// Start times already held by the mentor on a date.
#[utoipa::path(
    get,
    path = "/session/mentor/{mentor_id}/booked-slots",
    params(("mentor_id" = Uuid, Path, description = "The mentor's user id."), DateQuery),
    responses(
        (status = 200, description = "Occupied start times, HH:MM", body = [String]),
        (status = 400, description = "Malformed date")
    )
)]
pub async fn booked_slots_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(mentor_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let date = slots::parse_date(&query.date)?;
    let booked = state.mentorship.booked_slots(mentor_id, date).await?;
    Ok(Json(booked.into_iter().map(slots::format_time).collect()))
}

/// Every candidate slot on a date, with its availability right now.
#[utoipa::path(
    get,
    path = "/session/mentor/{mentor_id}/availability",
    params(("mentor_id" = Uuid, Path, description = "The mentor's user id."), DateQuery),
    responses(
        (status = 200, description = "Candidate slots", body = [SlotResponse]),
        (status = 400, description = "Malformed date")
    )
)]
pub async fn availability_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(mentor_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<Json<Vec<SlotResponse>>> {
    let date = slots::parse_date(&query.date)?;
    let slots_for_day = state
        .mentorship
        .availability(mentor_id, date, Utc::now())
        .await?;
    Ok(Json(
        slots_for_day
            .into_iter()
            .map(|slot| SlotResponse {
                start_time: slots::format_time(slot.start),
                end_time: slots::format_time(slot.end),
                available: slot.available,
            })
            .collect(),
    ))
}

/// The caller's sessions, filtered, sorted and paginated.
#[utoipa::path(
    get,
    path = "/session/my-sessions",
    params(MySessionsParams),
    responses(
        (status = 200, description = "One page of sessions", body = SessionListResponse),
        (status = 400, description = "Unknown status, role, sort field or order")
    )
)]
pub async fn my_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiQuery(params): ApiQuery<MySessionsParams>,
) -> ApiResult<Json<SessionListResponse>> {
    let page = state
        .mentorship
        .my_sessions(&identity, params.into_query()?)
        .await?;
    Ok(Json(SessionListResponse {
        sessions: page.items.into_iter().map(SessionResponse::from).collect(),
        pagination: page.pagination.into(),
    }))
}

/// Pending and confirmed sessions from today on, soonest first.
#[utoipa::path(
    get,
    path = "/session/upcoming",
    responses((status = 200, description = "Upcoming sessions", body = [SessionResponse]))
)]
pub async fn upcoming_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = state
        .mentorship
        .upcoming_sessions(&identity, Utc::now())
        .await?;
    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

/// Sessions that can be reviewed, or that are over but not yet marked complete.
#[utoipa::path(
    get,
    path = "/session/pending-reviews",
    responses((status = 200, description = "Sessions needing attention", body = [PendingReviewResponse]))
)]
pub async fn pending_reviews_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<PendingReviewResponse>>> {
    let pending = state
        .mentorship
        .pending_reviews(&identity, Utc::now())
        .await?;
    Ok(Json(
        pending
            .into_iter()
            .map(|(session, eligibility)| PendingReviewResponse {
                session: session.into(),
                eligibility: eligibility.as_str().to_string(),
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/session/{id}",
    params(("id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 200, description = "The session", body = SessionResponse),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.mentorship.get_session(&identity, session_id).await?;
    Ok(Json(session.into()))
}

/// Move a session along pending -> confirmed -> completed, or cancel it.
#[utoipa::path(
    put,
    path = "/session/{id}/status",
    params(("id" = Uuid, Path, description = "The session id.")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = 400, description = "Illegal transition"),
        (status = 403, description = "Caller lacks authority for this transition"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Status changed concurrently")
    )
)]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let target: SessionStatus = req.status.parse()?;
    let session = state
        .mentorship
        .update_status(&identity, session_id, target)
        .await?;
    Ok(Json(session.into()))
}

/// Cancel a pending or confirmed session as either participant.
#[utoipa::path(
    put,
    path = "/session/{id}/cancel",
    params(("id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 200, description = "Cancelled session", body = SessionResponse),
        (status = 400, description = "Session already completed or cancelled"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn cancel_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .mentorship
        .cancel_session(&identity, session_id)
        .await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    put,
    path = "/session/{id}/meeting-link",
    params(("id" = Uuid, Path, description = "The session id.")),
    request_body = MeetingLinkRequest,
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = 400, description = "Blank link or finished session"),
        (status = 403, description = "Caller is not the session's mentor")
    )
)]
pub async fn meeting_link_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<MeetingLinkRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .mentorship
        .set_meeting_link(&identity, session_id, &req.meeting_link)
        .await?;
    Ok(Json(session.into()))
}

/// Store the inline rating on a completed session.
#[utoipa::path(
    put,
    path = "/session/{id}/feedback",
    params(("id" = Uuid, Path, description = "The session id.")),
    request_body = RateSessionRequest,
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = 400, description = "Session not completed or rating out of range"),
        (status = 403, description = "Caller is not the session's student"),
        (status = 409, description = "Session already rated")
    )
)]
pub async fn rate_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RateSessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .mentorship
        .rate_session(&identity, session_id, req.rating, req.feedback)
        .await?;
    Ok(Json(session.into()))
}
