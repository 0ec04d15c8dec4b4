//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use liftlog::{
    api::routes::create_router,
    auth::ManualClock,
    db::TursoClient,
    AppState,
};

/// A server over a fresh in-memory database, plus the clock it reads.
pub struct TestApp {
    pub server: TestServer,
    pub clock: Arc<ManualClock>,
}

pub async fn create_test_app() -> TestApp {
    let db = TursoClient::new_memory()
        .await
        .expect("Failed to create in-memory database");
    let clock = Arc::new(ManualClock::starting_now());

    let state = AppState::new(Arc::new(db), clock.clone());
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    TestApp { server, clock }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Registers `username` with a derived email and returns the user JSON.
pub async fn register(server: &TestServer, username: &str, password: &str) -> Value {
    let response = server
        .post("/users")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": password
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    body["user"].clone()
}

/// Logs in and returns the bearer secret.
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/tokens/authentication")
        .json(&json!({
            "username": username,
            "password": password
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    body["auth_token"]
        .as_str()
        .expect("auth_token missing from login response")
        .to_string()
}

pub async fn register_and_login(server: &TestServer, username: &str) -> String {
    register(server, username, "secret123").await;
    login(server, username, "secret123").await
}

pub fn sample_workout() -> Value {
    json!({
        "title": "Leg day",
        "description": "Squats and lunges",
        "duration_minutes": 45,
        "calories_burned": 400,
        "entries": [
            { "exercise_name": "Squat", "sets": 5, "reps": 5, "weight": 100.0 },
            { "exercise_name": "Wall sit", "sets": 3, "duration_seconds": 60 }
        ]
    })
}

/// Creates a workout as the bearer of `token` and returns its id.
pub async fn create_workout(server: &TestServer, token: &str) -> i64 {
    let response = server
        .post("/workouts")
        .add_header("Authorization", bearer(token))
        .json(&sample_workout())
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    body["workout"]["id"].as_i64().expect("workout id missing")
}
