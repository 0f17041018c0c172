//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use mentorconnect_core::domain::{NewMentorProfile, Role};
use mentorconnect_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::ApiJson;
use crate::web::middleware::{session_cookie, SESSION_COOKIE};
use crate::web::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// `student` or `mentor`.
    #[schema(example = "student")]
    pub role: String,
    pub bio: Option<String>,
    pub hourly_rate: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

fn session_cookie_header(auth_session_id: &str, max_age: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        max_age.num_seconds()
    )
}

/// Issues a fresh auth session for `user_id` and returns its cookie header value.
async fn start_auth_session(state: &AppState, user_id: Uuid) -> ApiResult<String> {
    let lifetime = Duration::days(state.config.auth_session_days);
    let auth_session_id = Uuid::new_v4().to_string();
    state
        .db
        .create_auth_session(&auth_session_id, user_id, Utc::now() + lifetime)
        .await?;
    Ok(session_cookie_header(&auth_session_id, lifetime))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new student or mentor account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim();
    if !email.contains('@') {
        return Err(PortError::Validation("A valid email is required".to_string()).into());
    }
    if name.is_empty() {
        return Err(PortError::Validation("name is required".to_string()).into());
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(PortError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }
    let role: Role = req.role.parse()?;
    if role == Role::Admin {
        return Err(PortError::Forbidden("Admin accounts cannot self-register".to_string()).into());
    }

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create the user, plus the mentor profile for mentors
    let profile = (role == Role::Mentor).then(|| NewMentorProfile {
        bio: req.bio.clone(),
        hourly_rate: req.hourly_rate,
    });
    let user = state
        .db
        .create_user(&email, name, role, &password_hash, profile.as_ref())
        .await?;
    info!(user_id = %user.user_id, role = %role, "User signed up");

    // 3. Log the new user in
    let cookie = start_auth_session(&state, user.user_id).await?;
    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email,
        role: user.role.as_str().to_string(),
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    // 1. Get user by email
    let user_creds = state
        .db
        .get_user_by_email(&req.email.trim().to_lowercase())
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => PortError::Unauthorized,
            other => other,
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(PortError::Unauthorized.into());
    }

    // 3. Issue the cookie
    let cookie = start_auth_session(&state, user_creds.user_id).await?;
    let response = AuthResponse {
        user_id: user_creds.user_id,
        email: user_creds.email,
        role: user_creds.role.as_str().to_string(),
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let auth_session_id = session_cookie(&headers).ok_or(PortError::Unauthorized)?;
    state.db.delete_auth_session(auth_session_id).await?;

    let cookie = session_cookie_header("", Duration::zero());
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}
