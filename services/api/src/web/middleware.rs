//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use mentorconnect_core::ports::PortError;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Name of the cookie carrying the auth session id.
pub const SESSION_COOKIE: &str = "session";

/// Pulls the auth session id out of the `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session cookie and resolves the caller.
///
/// If valid, inserts the caller's `Identity` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned so that no borrow of the request is held across the await.
    let auth_session_id = session_cookie(req.headers())
        .map(str::to_string)
        .ok_or(PortError::Unauthorized)?;

    let identity = state
        .db
        .validate_auth_session(&auth_session_id)
        .await
        .map_err(|e| {
            warn!("Rejected auth session: {:?}", e);
            PortError::Unauthorized
        })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
