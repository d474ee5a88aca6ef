// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile, team and deletion routes.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{create_test_app, create_user, send};

#[tokio::test]
async fn test_profile_includes_virtual_fields() {
    let (app, _state) = create_test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "username": "daniel",
            "email": "Daniel@Example.com",
            "firstName": "Daniel",
            "lastName": "Sport",
            "dateOfBirth": "1990-01-01",
            "heightCm": 180.0,
            "weightKg": 81.0,
            "goals": ["Run 10k"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let user = &json["data"];
    assert_eq!(user["email"], "daniel@example.com");
    assert_eq!(user["fullName"], "Daniel Sport");
    assert_eq!(user["bmi"], 25.0);
    assert!(user["age"].as_u64().unwrap() >= 34);
    assert_eq!(user["fitnessLevel"], "beginner");
    assert_eq!(user["stats"]["totalWorkouts"], 0);
}

#[tokio::test]
async fn test_duplicate_username_or_email_rejected() {
    let (app, _state) = create_test_app();
    create_user(&app, "taken").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "username": "other",
            "email": "taken@example.com",
            "firstName": "A",
            "lastName": "B"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "email");

    let (status, json) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "username": "taken",
            "email": "fresh@example.com",
            "firstName": "A",
            "lastName": "B"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "username");
}

#[tokio::test]
async fn test_create_requires_identity_fields() {
    let (app, _state) = create_test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "firstName": "No", "lastName": "Identity" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["username", "email"]);
}

#[tokio::test]
async fn test_update_keeps_identity_and_stats() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "changer").await;

    send(
        &app,
        "POST",
        "/api/workouts",
        Some(&user_id),
        Some(json!({ "name": "Ride", "type": "cardio", "duration": 40 })),
    )
    .await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/users/{}", user_id),
        None,
        Some(json!({
            "username": "ignored",
            "firstName": "New",
            "lastName": "Name",
            "fitnessLevel": "advanced"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["username"], "changer");
    assert_eq!(json["data"]["fullName"], "New Name");
    assert_eq!(json["data"]["fitnessLevel"], "advanced");
    assert_eq!(json["data"]["stats"]["totalDuration"], 40);
}

#[tokio::test]
async fn test_update_ignores_invalid_identity_fields() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "steady").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/users/{}", user_id),
        None,
        Some(json!({
            "username": "x",
            "email": "not-an-email",
            "firstName": "Still",
            "lastName": "Valid"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["data"]["username"], "steady");
    assert_eq!(json["data"]["email"], "steady@example.com");
    assert_eq!(json["data"]["fullName"], "Still Valid");
}

#[tokio::test]
async fn test_leave_unjoined_team_changes_nothing() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "loner").await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}/teams/no-such-team", user_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, "GET", &format!("/api/users/{}", user_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["teams"], json!([]));
}

#[tokio::test]
async fn test_login_starts_streak() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "streaker").await;

    let uri = format!("/api/users/{}/login", user_id);
    let (status, json) = send(&app, "POST", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["stats"]["currentStreak"], 1);
    assert!(json["data"]["lastLogin"].is_string());

    // Same-day login leaves the streak alone
    let (_, json) = send(&app, "POST", &uri, None, None).await;
    assert_eq!(json["data"]["stats"]["currentStreak"], 1);
    assert_eq!(json["data"]["stats"]["longestStreak"], 1);
}

#[tokio::test]
async fn test_team_join_and_leave() {
    let (app, _state) = create_test_app();
    let user_id = create_user(&app, "teammate").await;
    let teams_uri = format!("/api/users/{}/teams", user_id);

    let (status, json) = send(
        &app,
        "POST",
        &teams_uri,
        None,
        Some(json!({ "teamId": "river-runners" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["teams"][0]["teamId"], "river-runners");
    assert_eq!(json["data"]["teams"][0]["role"], "member");

    let (_, json) = send(
        &app,
        "POST",
        &teams_uri,
        None,
        Some(json!({ "teamId": "river-runners", "role": "captain" })),
    )
    .await;
    assert_eq!(json["data"]["teams"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["teams"][0]["role"], "captain");

    let leave_uri = format!("{}/river-runners", teams_uri);
    let (status, _) = send(&app, "DELETE", &leave_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &leave_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_removes_workouts() {
    let (app, state) = create_test_app();
    let user_id = create_user(&app, "leaver").await;

    for name in ["One", "Two"] {
        send(
            &app,
            "POST",
            "/api/workouts",
            Some(&user_id),
            Some(json!({ "name": name, "type": "sports", "duration": 15 })),
        )
        .await;
    }

    let (status, json) = send(&app, "DELETE", &format!("/api/users/{}", user_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], 3);

    let remaining = state
        .db
        .find_workouts(&user_id, &Default::default())
        .await
        .unwrap();
    assert!(remaining.is_empty());

    let (status, _) = send(&app, "GET", &format!("/api/users/{}", user_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
