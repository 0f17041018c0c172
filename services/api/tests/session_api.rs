//! HTTP-level tests for the `/session` endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{booking, future_date, TestApp, TestUser};
use serde_json::{json, Value};

use mentorconnect_core::domain::Role;

async fn book(app: &TestApp, student: &TestUser, mentor: &TestUser, date: &str, start: &str) -> Value {
    let end = format!("{:02}:00", start[..2].parse::<u32>().unwrap() + 1);
    let (status, body) = app
        .json(
            Method::POST,
            "/session/book",
            Some(student),
            Some(booking(mentor.id(), date, start, &end)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn set_status(app: &TestApp, user: &TestUser, id: &str, status: &str) -> (StatusCode, Value) {
    app.json(
        Method::PUT,
        &format!("/session/{id}/status"),
        Some(user),
        Some(json!({ "status": status })),
    )
    .await
}

#[tokio::test]
async fn protected_routes_require_a_session_cookie() {
    let app = TestApp::new();
    let (status, body) = app
        .json(Method::GET, "/session/my-sessions", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn booking_returns_a_pending_session() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let date = future_date(7);

    let session = book(&app, &student, &mentor, &date, "10:00").await;
    assert_eq!(session["status"], "pending");
    assert_eq!(session["date"], date.as_str());
    assert_eq!(session["startTime"], "10:00");
    assert_eq!(session["endTime"], "11:00");
    assert_eq!(session["topic"], "Career Advice");
    assert_eq!(session["studentId"], student.id().to_string());

    let (status, slots) = app
        .json(
            Method::GET,
            &format!("/session/mentor/{}/booked-slots?date={date}", mentor.id()),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slots, json!(["10:00"]));

    let (status, slots) = app
        .json(
            Method::GET,
            &format!("/session/mentor/{}/availability?date={date}", mentor.id()),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 11);
    let ten = slots.iter().find(|s| s["startTime"] == "10:00").unwrap();
    assert_eq!(ten["available"], false);
    let eleven = slots.iter().find(|s| s["startTime"] == "11:00").unwrap();
    assert_eq!(eleven["available"], true);
}

#[tokio::test]
async fn double_booking_a_slot_conflicts() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let rival = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let date = future_date(3);

    book(&app, &student, &mentor, &date, "13:00").await;
    let (status, body) = app
        .json(
            Method::POST,
            "/session/book",
            Some(&rival),
            Some(booking(mentor.id(), &date, "13:00", "14:00")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn malformed_bookings_are_rejected() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let date = future_date(5);

    let cases = [
        booking(mentor.id(), &date, "10:30", "11:30"),
        booking(mentor.id(), &date, "10:00", "12:00"),
        booking(mentor.id(), &date, "20:00", "21:00"),
        booking(mentor.id(), "10/06/2025", "10:00", "11:00"),
        booking(mentor.id(), &date, "9:00", "10:00"),
    ];
    for body in cases {
        let (status, json) = app
            .json(Method::POST, "/session/book", Some(&student), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {json}");
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    let mut blank_topic = booking(mentor.id(), &date, "10:00", "11:00");
    blank_topic["topic"] = json!("   ");
    let (status, _) = app
        .json(Method::POST, "/session/book", Some(&student), Some(blank_topic))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn undecodable_requests_get_the_json_error_envelope() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;

    let mut no_topic = booking(mentor.id(), &future_date(5), "10:00", "11:00");
    no_topic.as_object_mut().unwrap().remove("topic");
    let (status, json) = app
        .json(Method::POST, "/session/book", Some(&student), Some(no_topic))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("topic"), "{json}");

    let mut bad_mentor = booking(mentor.id(), &future_date(5), "10:00", "11:00");
    bad_mentor["mentorId"] = json!("not-a-uuid");
    let requests = [
        (Method::POST, "/session/book".to_string(), Some(bad_mentor)),
        (Method::GET, "/session/my-sessions?page=abc".to_string(), None),
        (Method::GET, "/session/not-a-uuid".to_string(), None),
        (
            Method::GET,
            format!("/session/mentor/{}/availability", mentor.id()),
            None,
        ),
    ];
    for (method, uri, body) in requests {
        let (status, json) = app.json(method, &uri, Some(&student), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} -> {json}");
        assert_eq!(json["code"], "VALIDATION_ERROR", "{uri}");
        assert!(json["error"].is_string(), "{uri}");
    }

    let (status, json) = app
        .json(Method::GET, "/mentor/42/profile", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn only_students_book_and_only_existing_mentors() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let other_student = app.user(Role::Student).await;
    let date = future_date(2);

    let (status, _) = app
        .json(
            Method::POST,
            "/session/book",
            Some(&mentor),
            Some(booking(mentor.id(), &date, "10:00", "11:00")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(
            Method::POST,
            "/session/book",
            Some(&student),
            Some(booking(other_student.id(), &date, "10:00", "11:00")),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_changes_respect_who_may_make_them() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let outsider = app.user(Role::Mentor).await;
    let session = book(&app, &student, &mentor, &future_date(4), "16:00").await;
    let id = session["id"].as_str().unwrap();

    let (status, _) = set_status(&app, &student, id, "confirmed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = set_status(&app, &outsider, id, "confirmed").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = set_status(&app, &mentor, id, "completed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = set_status(&app, &mentor, id, "archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = set_status(&app, &mentor, id, "confirmed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    let (status, body) = set_status(&app, &student, id, "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = set_status(&app, &mentor, id, "confirmed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancel_endpoint_keeps_the_record() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let outsider = app.user(Role::Student).await;
    let session = book(&app, &student, &mentor, &future_date(4), "09:00").await;
    let id = session["id"].as_str().unwrap();

    let (status, _) = app
        .json(Method::PUT, &format!("/session/{id}/cancel"), Some(&outsider), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(Method::PUT, &format!("/session/{id}/cancel"), Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, body) = app
        .json(Method::GET, &format!("/session/{id}"), Some(&mentor), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = app
        .json(Method::PUT, &format!("/session/{id}/cancel"), Some(&mentor), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sessions_are_visible_to_participants_only() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let outsider = app.user(Role::Student).await;
    let session = book(&app, &student, &mentor, &future_date(6), "12:00").await;
    let id = session["id"].as_str().unwrap();

    let (status, _) = app
        .json(Method::GET, &format!("/session/{id}"), Some(&outsider), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = app
        .json(Method::GET, &format!("/session/{missing}"), Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn only_the_mentor_sets_the_meeting_link() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let session = book(&app, &student, &mentor, &future_date(8), "18:00").await;
    let id = session["id"].as_str().unwrap();
    let link = json!({ "meetingLink": "https://meet.example.com/abc" });

    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/session/{id}/meeting-link"),
            Some(&student),
            Some(link.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/session/{id}/meeting-link"),
            Some(&mentor),
            Some(link),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meetingLink"], "https://meet.example.com/abc");
}

#[tokio::test]
async fn my_sessions_paginates_and_filters() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let date = future_date(10);
    let mut ids = Vec::new();
    for start in ["09:00", "10:00", "11:00", "12:00", "13:00"] {
        let session = book(&app, &student, &mentor, &date, start).await;
        ids.push(session["id"].as_str().unwrap().to_string());
    }
    set_status(&app, &mentor, &ids[0], "confirmed").await;

    let (status, body) = app
        .json(
            Method::GET,
            "/session/my-sessions?page=2&limit=2",
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["totalPages"], 3);

    let (_, body) = app
        .json(
            Method::GET,
            "/session/my-sessions?status=confirmed",
            Some(&student),
            None,
        )
        .await;
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], ids[0].as_str());

    let (_, body) = app
        .json(Method::GET, "/session/my-sessions", Some(&mentor), None)
        .await;
    assert_eq!(body["pagination"]["total"], 5);

    let (status, _) = app
        .json(
            Method::GET,
            "/session/my-sessions?sortBy=price",
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upcoming_lists_active_sessions_soonest_first() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let later = book(&app, &student, &mentor, &future_date(9), "09:00").await;
    let sooner = book(&app, &student, &mentor, &future_date(2), "15:00").await;
    let dropped = book(&app, &student, &mentor, &future_date(3), "15:00").await;
    let dropped_id = dropped["id"].as_str().unwrap();
    app.json(
        Method::PUT,
        &format!("/session/{dropped_id}/cancel"),
        Some(&student),
        None,
    )
    .await;

    let (status, body) = app
        .json(Method::GET, "/session/upcoming", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![sooner["id"].as_str().unwrap(), later["id"].as_str().unwrap()]
    );
}

#[tokio::test]
async fn completed_sessions_show_up_for_review() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let session = book(&app, &student, &mentor, &future_date(1), "11:00").await;
    let id = session["id"].as_str().unwrap();
    set_status(&app, &mentor, id, "confirmed").await;
    let (status, _) = set_status(&app, &mentor, id, "completed").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .json(Method::GET, "/session/pending-reviews", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let pending = body.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["session"]["id"], id);
    assert_eq!(pending[0]["eligibility"], "reviewable");

    let (_, body) = app
        .json(Method::GET, &format!("/mentor/{}/profile", mentor.id()), None, None)
        .await;
    assert_eq!(body["totalSessions"], 1);
    assert_eq!(body["rating"], 0.0);
}

#[tokio::test]
async fn inline_rating_requires_a_completed_session() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let session = book(&app, &student, &mentor, &future_date(1), "14:00").await;
    let id = session["id"].as_str().unwrap();
    let rating = json!({ "rating": 4, "feedback": "Clear explanations" });

    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/session/{id}/feedback"),
            Some(&student),
            Some(rating.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    set_status(&app, &mentor, id, "confirmed").await;
    set_status(&app, &mentor, id, "completed").await;

    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/session/{id}/feedback"),
            Some(&mentor),
            Some(rating.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/session/{id}/feedback"),
            Some(&student),
            Some(rating),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 4);
    assert_eq!(body["feedback"], "Clear explanations");
}
