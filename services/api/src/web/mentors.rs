//! services/api/src/web/mentors.rs
//!
//! Read-only view of a mentor's profile and derived rating.

use axum::{
    extract::State,
    Json,
};
use mentorconnect_core::domain::MentorProfile;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::ApiPath;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorProfileResponse {
    pub user_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub hourly_rate: Option<f64>,
    /// Mean feedback rating, one decimal; 0 with no feedback.
    pub rating: f64,
    pub total_sessions: i64,
}

impl From<MentorProfile> for MentorProfileResponse {
    fn from(p: MentorProfile) -> Self {
        Self {
            user_id: p.user_id,
            name: p.name,
            bio: p.bio,
            hourly_rate: p.hourly_rate,
            rating: p.rating,
            total_sessions: p.total_sessions,
        }
    }
}

#[utoipa::path(
    get,
    path = "/mentor/{mentor_id}/profile",
    params(("mentor_id" = Uuid, Path, description = "The mentor's user id.")),
    responses(
        (status = 200, description = "The mentor profile", body = MentorProfileResponse),
        (status = 404, description = "Mentor not found")
    )
)]
pub async fn mentor_profile_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(mentor_id): ApiPath<Uuid>,
) -> ApiResult<Json<MentorProfileResponse>> {
    let profile = state.mentorship.mentor_profile(mentor_id).await?;
    Ok(Json(profile.into()))
}
