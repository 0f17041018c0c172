//! services/api/src/web/feedback.rs
//!
//! Axum handlers for structured post-session feedback and mentor rating stats.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use mentorconnect_core::domain::{FeedbackUpdate, Identity, PageRequest};
use mentorconnect_core::CreateFeedbackRequest;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::rest::{CategoriesPayload, FeedbackResponse, PaginationResponse};
use crate::web::state::AppState;

//=========================================================================================
// API Payload and Query Structs
//=========================================================================================

fn default_public() -> bool {
    true
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackPayload {
    pub session_id: Uuid,
    pub mentor_id: Uuid,
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub categories: CategoriesPayload,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedbackPayload {
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub categories: Option<CategoriesPayload>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MentorFeedbackParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Only feedback rated at least this many stars.
    pub min_rating: Option<i16>,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackListResponse {
    pub feedback: Vec<FeedbackResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAveragesResponse {
    pub communication: f64,
    pub knowledge: f64,
    pub helpfulness: f64,
    pub professionalism: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStatsResponse {
    pub total_feedback: u64,
    pub average_rating: f64,
    /// Count per star value, keyed "1" through "5".
    pub rating_distribution: BTreeMap<String, u64>,
    pub category_averages: CategoryAveragesResponse,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Review a completed session. Recomputes the mentor's rating.
#[utoipa::path(
    post,
    path = "/feedback/create",
    request_body = CreateFeedbackPayload,
    responses(
        (status = 201, description = "Feedback created", body = FeedbackResponse),
        (status = 400, description = "Session not completed or rating out of range"),
        (status = 403, description = "Caller is not the session's student"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Feedback already exists for this session")
    )
)]
pub async fn create_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<CreateFeedbackPayload>,
) -> ApiResult<impl IntoResponse> {
    let request = CreateFeedbackRequest {
        session_id: req.session_id,
        mentor_id: req.mentor_id,
        rating: req.rating,
        comment: req.comment,
        categories: req.categories.into(),
        is_public: req.is_public,
    };
    let feedback = state
        .mentorship
        .create_feedback(&identity, request)
        .await?;
    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(feedback))))
}

/// Public feedback for a mentor, newest first.
#[utoipa::path(
    get,
    path = "/feedback/mentor/{mentor_id}",
    params(("mentor_id" = Uuid, Path, description = "The mentor's user id."), MentorFeedbackParams),
    responses(
        (status = 200, description = "One page of public feedback", body = FeedbackListResponse),
        (status = 400, description = "minRating out of range")
    )
)]
pub async fn mentor_feedback_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(mentor_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<MentorFeedbackParams>,
) -> ApiResult<Json<FeedbackListResponse>> {
    let page = state
        .mentorship
        .mentor_feedback(
            mentor_id,
            params.min_rating,
            PageRequest::new(params.page, params.limit),
        )
        .await?;
    Ok(Json(FeedbackListResponse {
        feedback: page.items.into_iter().map(FeedbackResponse::from).collect(),
        pagination: page.pagination.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/feedback/stats/{mentor_id}",
    params(("mentor_id" = Uuid, Path, description = "The mentor's user id.")),
    responses(
        (status = 200, description = "Aggregate feedback stats", body = FeedbackStatsResponse),
        (status = 404, description = "Mentor not found")
    )
)]
pub async fn feedback_stats_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(mentor_id): ApiPath<Uuid>,
) -> ApiResult<Json<FeedbackStatsResponse>> {
    let stats = state.mentorship.feedback_stats(mentor_id).await?;
    let c = stats.category_averages;
    Ok(Json(FeedbackStatsResponse {
        total_feedback: stats.total_feedback,
        average_rating: stats.average_rating,
        rating_distribution: stats
            .rating_distribution
            .into_iter()
            .map(|(star, count)| (star.to_string(), count))
            .collect(),
        category_averages: CategoryAveragesResponse {
            communication: c.communication,
            knowledge: c.knowledge,
            helpfulness: c.helpfulness,
            professionalism: c.professionalism,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/feedback/session/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 200, description = "The session's feedback", body = FeedbackResponse),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "No such session or no feedback yet")
    )
)]
pub async fn session_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> ApiResult<Json<FeedbackResponse>> {
    let feedback = state
        .mentorship
        .feedback_for_session(&identity, session_id)
        .await?;
    Ok(Json(feedback.into()))
}

/// Edit your own feedback. Recomputes the mentor's rating.
#[utoipa::path(
    put,
    path = "/feedback/{id}",
    params(("id" = Uuid, Path, description = "The feedback id.")),
    request_body = UpdateFeedbackPayload,
    responses(
        (status = 200, description = "Updated feedback", body = FeedbackResponse),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Feedback not found")
    )
)]
pub async fn update_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(feedback_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateFeedbackPayload>,
) -> ApiResult<Json<FeedbackResponse>> {
    let update = FeedbackUpdate {
        rating: req.rating,
        comment: req.comment,
        categories: req.categories.map(Into::into),
        is_public: req.is_public,
    };
    let feedback = state
        .mentorship
        .update_feedback(&identity, feedback_id, update)
        .await?;
    Ok(Json(feedback.into()))
}

/// Delete your own feedback. Recomputes the mentor's rating.
#[utoipa::path(
    delete,
    path = "/feedback/{id}",
    params(("id" = Uuid, Path, description = "The feedback id.")),
    responses(
        (status = 204, description = "Feedback deleted"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Feedback not found")
    )
)]
pub async fn delete_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(feedback_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .mentorship
        .delete_feedback(&identity, feedback_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
