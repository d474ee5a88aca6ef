// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use danielsport::config::Config;
use danielsport::db::{FirestoreDb, MemoryDb};
use danielsport::routes::create_router;
use danielsport::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by in-memory storage.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db: Arc::new(MemoryDb::new()),
    });

    (create_router(state.clone()), state)
}

/// Send one request and decode the JSON response body.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Create a user through the API and return its ID.
#[allow(dead_code)]
pub async fn create_user(app: &Router, username: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "firstName": "Test",
            "lastName": "User"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create user failed: {}", json);
    json["data"]["id"].as_str().unwrap().to_string()
}

/// Fetch a user's lifetime stats through the API.
#[allow(dead_code)]
pub async fn user_stats(app: &Router, user_id: &str) -> Value {
    let (status, json) = send(app, "GET", &format!("/api/users/{}", user_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    json["data"]["stats"].clone()
}
