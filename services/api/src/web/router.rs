//! services/api/src/web/router.rs
//!
//! Assembles the full HTTP application: public routes, cookie-protected routes,
//! CORS, request tracing and the Swagger UI.

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ConfigError;
use crate::error::ApiResult;
use crate::web::{
    auth::{login_handler, logout_handler, signup_handler},
    feedback, mentors,
    middleware::require_auth,
    rest::ApiDoc,
    sessions,
    state::AppState,
};

pub fn build_router(app_state: Arc<AppState>) -> ApiResult<Router> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/feedback/mentor/{mentor_id}", get(feedback::mentor_feedback_handler))
        .route("/feedback/stats/{mentor_id}", get(feedback::feedback_stats_handler))
        .route("/mentor/{mentor_id}/profile", get(mentors::mentor_profile_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/session/book", post(sessions::book_session_handler))
        .route(
            "/session/mentor/{mentor_id}/booked-slots",
            get(sessions::booked_slots_handler),
        )
        .route(
            "/session/mentor/{mentor_id}/availability",
            get(sessions::availability_handler),
        )
        .route("/session/my-sessions", get(sessions::my_sessions_handler))
        .route("/session/upcoming", get(sessions::upcoming_sessions_handler))
        .route("/session/pending-reviews", get(sessions::pending_reviews_handler))
        .route("/session/{id}", get(sessions::get_session_handler))
        .route("/session/{id}/status", put(sessions::update_status_handler))
        .route("/session/{id}/cancel", put(sessions::cancel_session_handler))
        .route("/session/{id}/meeting-link", put(sessions::meeting_link_handler))
        .route("/session/{id}/feedback", put(sessions::rate_session_handler))
        .route("/feedback/create", post(feedback::create_feedback_handler))
        .route(
            "/feedback/session/{session_id}",
            get(feedback::session_feedback_handler),
        )
        .route(
            "/feedback/{id}",
            put(feedback::update_feedback_handler).delete(feedback::delete_feedback_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
