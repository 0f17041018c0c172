//! Shared helpers for the integration tests.
//!
//! Everything runs against `InMemoryAdapter`, so no database is needed. Users
//! are inserted straight into the adapter with a placeholder password hash and
//! an auth session, which skips argon2 for every test except the auth ones.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use api_lib::adapters::InMemoryAdapter;
use api_lib::config::Config;
use api_lib::web::{build_router, AppState};
use mentorconnect_core::domain::{Identity, NewMentorProfile, Role};
use mentorconnect_core::ports::DatabaseService;
use mentorconnect_core::MentorshipService;

pub struct TestUser {
    pub identity: Identity,
    /// Value for the `Cookie` header.
    pub cookie: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.identity.user_id
    }
}

pub struct TestApp {
    pub router: Router,
    pub adapter: Arc<InMemoryAdapter>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        let adapter = Arc::new(InMemoryAdapter::new());
        let state = Arc::new(AppState::new(
            adapter.clone(),
            adapter.clone(),
            Arc::new(Config::default()),
        ));
        let router = build_router(state.clone()).unwrap();
        Self {
            router,
            adapter,
            state,
        }
    }

    pub fn service(&self) -> &MentorshipService {
        &self.state.mentorship
    }

    /// Inserts a user (and a mentor profile for mentors) and logs them in.
    pub async fn user(&self, role: Role) -> TestUser {
        create_user(&self.adapter, role).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, &user.cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for an empty body).
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(method, uri, user, body).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

pub async fn create_user(adapter: &InMemoryAdapter, role: Role) -> TestUser {
    let email = format!("{}-{}@example.com", role, Uuid::new_v4());
    let profile = (role == Role::Mentor).then(|| NewMentorProfile {
        bio: Some("Staff engineer".to_string()),
        hourly_rate: Some(80.0),
    });
    let user = adapter
        .create_user(
            &email,
            &format!("Test {role}"),
            role,
            "not-a-real-hash",
            profile.as_ref(),
        )
        .await
        .unwrap();
    let auth_session_id = Uuid::new_v4().to_string();
    adapter
        .create_auth_session(&auth_session_id, user.user_id, Utc::now() + Duration::days(1))
        .await
        .unwrap();
    TestUser {
        identity: Identity {
            user_id: user.user_id,
            role,
        },
        cookie: format!("session={auth_session_id}"),
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// A date safely in the future, formatted `YYYY-MM-DD`.
pub fn future_date(days_ahead: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days_ahead))
        .format("%Y-%m-%d")
        .to_string()
}

pub fn booking(mentor_id: Uuid, date: &str, start: &str, end: &str) -> Value {
    serde_json::json!({
        "mentorId": mentor_id,
        "date": date,
        "startTime": start,
        "endTime": end,
        "topic": "Career Advice",
        "notes": "Moving from backend to infra",
    })
}
