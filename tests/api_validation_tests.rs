// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation and caller identity tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_user, send};

#[tokio::test]
async fn test_health_needs_no_identity() {
    let (app, _state) = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["build_id"].is_string());
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let (app, _state) = create_test_app();

    let (status, json) = send(&app, "GET", "/api/workouts", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_blank_user_header_is_unauthorized() {
    let (app, _state) = create_test_app();

    let (status, _) = send(&app, "GET", "/api/workouts", Some("   "), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let (app, _state) = create_test_app();

    let (status, json) = send(&app, "GET", "/api/workouts", Some("no-such-user"), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_missing_required_fields_listed() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "forgetful").await;

    let (status, json) = send(&app, "POST", "/api/workouts", Some(&user_id), Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Validation failed");
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"duration"));
    assert!(fields.iter().any(|f| f.contains("type")));
}

#[tokio::test]
async fn test_non_numeric_duration_rejected() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "stringy").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/workouts",
        Some(&user_id),
        Some(json!({ "name": "Run", "type": "cardio", "duration": "thirty" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "body");
}

#[tokio::test]
async fn test_nested_exercise_errors_have_paths() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "nester").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/workouts",
        Some(&user_id),
        Some(json!({
            "name": "Push day",
            "type": "strength",
            "duration": 50,
            "exercises": [
                { "name": "Bench", "sets": 4, "reps": 8 },
                { "name": "Dips", "sets": 0 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let field = json["errors"][0]["field"].as_str().unwrap();
    assert!(field.starts_with("exercises[1]"), "got {}", field);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "typo").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/workouts")
                .header("x-user-id", &user_id)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pagination_rejects_page_zero_and_large_limit() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "paging").await;

    let (status, _) = send(&app, "GET", "/api/workouts?page=0", Some(&user_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/workouts?limit=500", Some(&user_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_date_filter_rejected() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "dates").await;

    let (status, _) = send(
        &app,
        "GET",
        "/api/workouts?startDate=last-week",
        Some(&user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        "/api/workouts?startDate=2024-03-10&endDate=2024-03-01",
        Some(&user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_user_profile_fields() {
    let (app, _state) = create_test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "username": "no spaces allowed",
            "email": "not-an-email",
            "firstName": "A",
            "lastName": "B",
            "heightCm": 20.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
    assert!(fields.iter().any(|f| f.starts_with("height")));
}
