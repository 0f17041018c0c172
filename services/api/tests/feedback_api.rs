//! HTTP-level tests for the `/feedback` endpoints and the mentor rating they drive.

mod common;

use axum::http::{Method, StatusCode};
use common::{booking, future_date, TestApp, TestUser};
use serde_json::{json, Value};

use mentorconnect_core::domain::Role;

/// Books, confirms and completes a session, returning its id.
async fn completed_session(app: &TestApp, student: &TestUser, mentor: &TestUser, start: &str) -> String {
    let end = format!("{:02}:00", start[..2].parse::<u32>().unwrap() + 1);
    let (status, session) = app
        .json(
            Method::POST,
            "/session/book",
            Some(student),
            Some(booking(mentor.id(), &future_date(5), start, &end)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{session}");
    let id = session["id"].as_str().unwrap().to_string();
    for target in ["confirmed", "completed"] {
        let (status, _) = app
            .json(
                Method::PUT,
                &format!("/session/{id}/status"),
                Some(mentor),
                Some(json!({ "status": target })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    id
}

fn feedback_body(session_id: &str, mentor: &TestUser, rating: i64) -> Value {
    json!({
        "sessionId": session_id,
        "mentorId": mentor.id(),
        "rating": rating,
        "comment": "Walked me through system design interviews",
        "categories": { "communication": 5, "knowledge": rating },
    })
}

async fn mentor_rating(app: &TestApp, mentor: &TestUser) -> Value {
    let (status, body) = app
        .json(Method::GET, &format!("/mentor/{}/profile", mentor.id()), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    body["rating"].clone()
}

#[tokio::test]
async fn creating_feedback_updates_the_mentor_rating() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let session_id = completed_session(&app, &student, &mentor, "10:00").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/feedback/create",
            Some(&student),
            Some(feedback_body(&session_id, &mentor, 4)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["rating"], 4);
    assert_eq!(body["isPublic"], true);
    assert_eq!(body["categories"]["communication"], 5);
    assert_eq!(body["categories"]["helpfulness"], Value::Null);
    assert_eq!(mentor_rating(&app, &mentor).await, 4.0);

    let (status, body) = app
        .json(
            Method::POST,
            "/feedback/create",
            Some(&student),
            Some(feedback_body(&session_id, &mentor, 1)),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(mentor_rating(&app, &mentor).await, 4.0);
}

#[tokio::test]
async fn feedback_needs_a_completed_session_and_its_student() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let stranger = app.user(Role::Student).await;

    let (_, pending) = app
        .json(
            Method::POST,
            "/session/book",
            Some(&student),
            Some(booking(mentor.id(), &future_date(5), "15:00", "16:00")),
        )
        .await;
    let pending_id = pending["id"].as_str().unwrap();
    let (status, body) = app
        .json(
            Method::POST,
            "/feedback/create",
            Some(&student),
            Some(feedback_body(pending_id, &mentor, 5)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let done = completed_session(&app, &student, &mentor, "09:00").await;
    let (status, _) = app
        .json(
            Method::POST,
            "/feedback/create",
            Some(&stranger),
            Some(feedback_body(&done, &mentor, 5)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(
            Method::POST,
            "/feedback/create",
            Some(&mentor),
            Some(feedback_body(&done, &mentor, 5)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(
            Method::POST,
            "/feedback/create",
            Some(&student),
            Some(feedback_body(&done, &mentor, 0)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(mentor_rating(&app, &mentor).await, 0.0);
}

#[tokio::test]
async fn editing_and_deleting_feedback_recomputes_the_rating() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let first = completed_session(&app, &student, &mentor, "09:00").await;
    let second = completed_session(&app, &student, &mentor, "10:00").await;

    let mut feedback_ids = Vec::new();
    for (session_id, rating) in [(&first, 5), (&second, 3)] {
        let (status, body) = app
            .json(
                Method::POST,
                "/feedback/create",
                Some(&student),
                Some(feedback_body(session_id, &mentor, rating)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        feedback_ids.push(body["id"].as_str().unwrap().to_string());
    }
    assert_eq!(mentor_rating(&app, &mentor).await, 4.0);

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/feedback/{}", feedback_ids[1]),
            Some(&student),
            Some(json!({ "rating": 4, "isPublic": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 4);
    assert_eq!(body["isPublic"], false);
    assert_eq!(mentor_rating(&app, &mentor).await, 4.5);

    let (status, _) = app
        .json(
            Method::DELETE,
            &format!("/feedback/{}", feedback_ids[1]),
            Some(&mentor),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for id in &feedback_ids {
        let (status, body) = app
            .json(Method::DELETE, &format!("/feedback/{id}"), Some(&student), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
    }
    assert_eq!(mentor_rating(&app, &mentor).await, 0.0);

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/feedback/session/{first}"),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_listing_hides_private_feedback_and_filters_by_stars() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;

    for (start, rating, public) in [("09:00", 5, true), ("10:00", 2, true), ("11:00", 4, false)] {
        let session_id = completed_session(&app, &student, &mentor, start).await;
        let mut body = feedback_body(&session_id, &mentor, rating);
        body["isPublic"] = json!(public);
        let (status, _) = app
            .json(Method::POST, "/feedback/create", Some(&student), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/feedback/mentor/{}", mentor.id()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feedback"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = app
        .json(
            Method::GET,
            &format!("/feedback/mentor/{}?minRating=4", mentor.id()),
            None,
            None,
        )
        .await;
    let listed = body["feedback"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["rating"], 5);

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/feedback/mentor/{}?minRating=9", mentor.id()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Private feedback still counts toward the aggregate.
    assert_eq!(mentor_rating(&app, &mentor).await, 3.7);
}

#[tokio::test]
async fn stats_summarise_all_feedback() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/feedback/stats/{}", mentor.id()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalFeedback"], 0);
    assert_eq!(body["averageRating"], 0.0);
    assert_eq!(body["ratingDistribution"]["5"], 0);

    for (start, rating) in [("09:00", 5), ("10:00", 5), ("11:00", 4)] {
        let session_id = completed_session(&app, &student, &mentor, start).await;
        app.json(
            Method::POST,
            "/feedback/create",
            Some(&student),
            Some(feedback_body(&session_id, &mentor, rating)),
        )
        .await;
    }

    let (_, body) = app
        .json(
            Method::GET,
            &format!("/feedback/stats/{}", mentor.id()),
            None,
            None,
        )
        .await;
    assert_eq!(body["totalFeedback"], 3);
    assert_eq!(body["averageRating"], 4.7);
    assert_eq!(body["ratingDistribution"]["5"], 2);
    assert_eq!(body["ratingDistribution"]["4"], 1);
    assert_eq!(body["ratingDistribution"]["1"], 0);
    assert_eq!(body["categoryAverages"]["communication"], 5.0);
    assert_eq!(body["categoryAverages"]["knowledge"], 4.7);
    assert_eq!(body["categoryAverages"]["helpfulness"], 0.0);

    let unknown = uuid::Uuid::new_v4();
    let (status, _) = app
        .json(Method::GET, &format!("/feedback/stats/{unknown}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_feedback_is_visible_to_both_participants() {
    let app = TestApp::new();
    let student = app.user(Role::Student).await;
    let mentor = app.user(Role::Mentor).await;
    let outsider = app.user(Role::Student).await;
    let session_id = completed_session(&app, &student, &mentor, "13:00").await;
    app.json(
        Method::POST,
        "/feedback/create",
        Some(&student),
        Some(feedback_body(&session_id, &mentor, 5)),
    )
    .await;

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/feedback/session/{session_id}"),
            Some(&mentor),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session_id.as_str());
    assert_eq!(body["studentId"], student.id().to_string());

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/feedback/session/{session_id}"),
            Some(&outsider),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
