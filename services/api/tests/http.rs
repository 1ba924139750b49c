use std::collections::HashMap;
use std::sync::Arc;

use api_lib::adapters::InMemoryDbAdapter;
use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use habit_tracker_core::FixedClock;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(vars: &[(&str, &str)]) -> Router {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Arc::new(Config::from_lookup(|key| vars.get(key).cloned()).unwrap());
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
    let state = AppState::new(Arc::new(InMemoryDbAdapter::new()), Arc::new(clock), config);
    router(Arc::new(state))
}

fn app() -> Router {
    app_with(&[])
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({"name": "Test User", "email": "test@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "test@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_habit(app: &Router, token: &str, body: Value) -> String {
    let (status, body) = send(app, "POST", "/api/habits", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_responds() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("API is running...".to_string()));
}

#[tokio::test]
async fn registering_twice_is_rejected() {
    let app = app();
    login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({"name": "Test User", "email": "test@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::String("User already exists".to_string()));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app();
    login(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "test@example.com", "password": "wrongpassword"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn habits_require_authentication() {
    let app = app();
    let (status, _) = send(&app, "GET", "/api/habits", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/habits", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let app = app();
    let token = login(&app).await;

    let (status, _) = send(&app, "POST", "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/habits", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_and_fetch_a_habit() {
    let app = app();
    let token = login(&app).await;

    let id = create_habit(
        &app,
        &token,
        json!({
            "title": "Read a book",
            "description": "Read 10 pages of a book daily",
            "frequency": "daily",
            "tags": ["reading", "self-improvement"],
            "reminder_time": "21:30"
        }),
    )
    .await;

    let (status, body) = send(&app, "GET", &format!("/api/habits/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Read a book");
    assert_eq!(body["reminder_time"], "21:30");
    assert_eq!(body["current_streak"], 0);
}

#[tokio::test]
async fn invalid_habits_are_rejected() {
    let app = app();
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/habits",
        Some(&token),
        Some(json!({"title": "Run", "frequency": "hourly"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn habits_paginate_and_filter_by_tag() {
    let app = app();
    let token = login(&app).await;

    create_habit(&app, &token, json!({"title": "Habit 1", "frequency": "daily"})).await;
    create_habit(
        &app,
        &token,
        json!({"title": "Reading Habit", "frequency": "daily", "tags": ["reading"]}),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/habits?page=1&limit=1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["habits"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total_pages"], 2);

    let (status, body) = send(&app, "GET", "/api/habits?tag=reading", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["habits"].as_array().unwrap().len(), 1);
    assert_eq!(body["habits"][0]["tags"][0], "reading");

    let (status, _) = send(&app, "GET", "/api/habits?page=5&limit=1", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_and_delete_a_habit() {
    let app = app();
    let token = login(&app).await;
    let id = create_habit(&app, &token, json!({"title": "Run", "frequency": "daily"})).await;
    let uri = format!("/api/habits/{}", id);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"title": "Run 5k", "frequency": "weekly"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Run 5k");
    assert_eq!(body["frequency"], "weekly");

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tracking_updates_streaks() {
    let app = app();
    let token = login(&app).await;
    let id = create_habit(&app, &token, json!({"title": "Trackable", "frequency": "daily"})).await;
    let uri = format!("/api/habits/{}/track", id);

    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["date"], "2024-06-15");
    assert_eq!(body["current_streak"], 1);
    assert_eq!(body["longest_streak"], 1);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({"date": "2024-06-14"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["current_streak"], 2);
    assert_eq!(body["longest_streak"], 2);
}

#[tokio::test]
async fn tracking_twice_on_one_day_is_rejected() {
    let app = app();
    let token = login(&app).await;
    let id = create_habit(&app, &token, json!({"title": "Trackable", "frequency": "daily"})).await;
    let uri = format!("/api/habits/{}/track", id);

    send(&app, "POST", &uri, Some(&token), None).await;
    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        Value::String("Habit already tracked for this date".to_string())
    );
}

#[tokio::test]
async fn malformed_and_future_dates_are_rejected() {
    let app = app();
    let token = login(&app).await;
    let id = create_habit(&app, &token, json!({"title": "Trackable", "frequency": "daily"})).await;
    let uri = format!("/api/habits/{}/track", id);

    let (status, _) = send(&app, "POST", &uri, Some(&token), Some(json!({"date": "soon"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({"date": "2024-06-20"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_needs_seven_logs() {
    let app = app();
    let token = login(&app).await;
    let id = create_habit(&app, &token, json!({"title": "Trackable", "frequency": "daily"})).await;
    let track = format!("/api/habits/{}/track", id);
    let history = format!("/api/habits/{}/history", id);

    let (status, _) = send(&app, "GET", &history, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for day in 9..=15 {
        let date = format!("2024-06-{:02}", day);
        let (status, _) = send(&app, "POST", &track, Some(&token), Some(json!({"date": date}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", &history, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_logs"], 7);
    assert_eq!(body["last_7_days"][0], "2024-06-15");
    assert_eq!(body["last_7_days"][6], "2024-06-09");
}

#[tokio::test]
async fn requests_over_the_limit_are_throttled() {
    let app = app_with(&[("RATE_LIMIT_MAX", "2")]);

    for _ in 0..2 {
        let (status, _) = send(&app, "GET", "/api", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = send(&app, "GET", "/api", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
