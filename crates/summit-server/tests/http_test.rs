//! HTTP surface tests
//!
//! Requests go through the full router, middleware included, via `oneshot`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use summit_core::{Cache, MemoryCache, MemoryStore, Task, TaskDispatcher};
use summit_server::{AppState, ConferenceApi, SystemEnv, router};
use tower::ServiceExt;

struct DiscardTasks;

impl TaskDispatcher for DiscardTasks {
    fn enqueue(&self, _task: Task) {}
}

fn app() -> Router {
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(SystemEnv::new(), None));
    let api = ConferenceApi::new(Arc::new(MemoryStore::new()), cache, Arc::new(DiscardTasks));
    router(AppState::new(Arc::new(api)))
}

struct Reply {
    status: StatusCode,
    request_id: Option<String>,
    body: Value,
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder
            .header("x-user-id", user)
            .header("x-user-email", format!("{user}@example.com"))
            .header("x-user-name", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    Reply { status, request_id, body }
}

async fn create_conference(app: &Router, user: &str, body: Value) -> String {
    let reply = send(app, Method::POST, "/conference", Some(user), Some(body)).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    reply.body["websafeKey"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn announcement_is_public() {
    let app = app();

    let reply = send(&app, Method::GET, "/announcement", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "data": "" }));

    let reply = send(&app, Method::GET, "/featuredSpeaker", None, None).await;
    assert_eq!(reply.body, json!({ "data": "" }));
}

#[tokio::test]
async fn writes_require_caller_identity() {
    let app = app();

    let body = json!({ "name": "RustConf" });
    let reply = send(&app, Method::POST, "/conference", None, Some(body)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"]["errorCode"], "UNAUTHORIZED");

    let reply = send(&app, Method::GET, "/profile", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let app = app();

    let request = Request::builder()
        .uri("/announcement")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");

    let reply = send(&app, Method::GET, "/announcement", None, None).await;
    assert_eq!(reply.request_id.map(|id| id.len()), Some(26));
}

#[tokio::test]
async fn conference_create_get_and_update() {
    let app = app();
    let key = create_conference(
        &app,
        "ada",
        json!({
            "name": "RustConf",
            "city": "Portland",
            "maxAttendees": 10,
            "startDate": "2026-09-08"
        }),
    )
    .await;

    let reply = send(&app, Method::GET, &format!("/conference/{key}"), None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["name"], "RustConf");
    assert_eq!(reply.body["month"], 9);
    assert_eq!(reply.body["seatsAvailable"], 10);
    assert_eq!(reply.body["organizerUserId"], "ada");

    let uri = format!("/conference/{key}");
    let reply = send(&app, Method::PUT, &uri, Some("bob"), Some(json!({ "name": "Mine" }))).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"]["errorCode"], "FORBIDDEN");

    let reply =
        send(&app, Method::PUT, &uri, Some("ada"), Some(json!({ "city": "Seattle" }))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["city"], "Seattle");
    assert_eq!(reply.body["name"], "RustConf");
}

#[tokio::test]
async fn registration_over_http() {
    let app = app();
    let key =
        create_conference(&app, "organizer", json!({ "name": "Tiny", "maxAttendees": 1 })).await;
    let uri = format!("/conference/{key}/registration");

    let reply = send(&app, Method::POST, &uri, Some("ada"), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "data": true }));

    let reply = send(&app, Method::POST, &uri, Some("bob"), None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"]["errorCode"], "CONFLICT");

    let reply = send(&app, Method::GET, "/conferences/attending", Some("ada"), None).await;
    assert_eq!(reply.body["items"][0]["websafeKey"], key.as_str());

    let reply = send(&app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(reply.body, json!({ "data": false }));
    let reply = send(&app, Method::DELETE, &uri, Some("ada"), None).await;
    assert_eq!(reply.body, json!({ "data": true }));
}

#[tokio::test]
async fn query_conferences_over_http() {
    let app = app();
    for (name, max_attendees) in [("Big", 500), ("Small", 20)] {
        let body = json!({ "name": name, "city": "London", "maxAttendees": max_attendees });
        create_conference(&app, "ada", body).await;
    }

    let filters = json!({ "filters": [
        { "field": "CITY", "operator": "EQ", "value": "London" },
        { "field": "MAX_ATTENDEES", "operator": "LT", "value": "100" },
    ]});
    let reply = send(&app, Method::POST, "/queryConferences", None, Some(filters)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(reply.body["items"][0]["name"], "Small");

    let bad = json!({ "filters": [{ "field": "COUNTRY", "operator": "EQ", "value": "UK" }] });
    let reply = send(&app, Method::POST, "/queryConferences", None, Some(bad)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["errorCode"], "BAD_REQUEST");
}

#[tokio::test]
async fn profile_is_saved_partially() {
    let app = app();

    let reply = send(&app, Method::GET, "/profile", Some("ada"), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["teeShirtSize"], "NOT_SPECIFIED");

    let form = json!({ "teeShirtSize": "M_W" });
    let reply = send(&app, Method::POST, "/profile", Some("ada"), Some(form)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["displayName"], "ada");
    assert_eq!(reply.body["teeShirtSize"], "M_W");
}

#[tokio::test]
async fn bad_keys_and_unknown_routes() {
    let app = app();

    let reply = send(&app, Method::GET, "/conference/garbage", None, None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&app, Method::GET, "/conference/conf:7:ada", None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"]["errorCode"], "NOT_FOUND");

    let reply = send(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"]["message"], "not found: /nowhere");

    let reply = send(&app, Method::DELETE, "/announcement", None, None).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(reply.body["error"]["errorCode"], "METHOD_NOT_ALLOWED");
}

async fn send_raw(
    app: &Router,
    uri: &str,
    content_type: Option<&str>,
    body: &'static str,
) -> Reply {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-user-id", "ada")
        .header("x-user-email", "ada@example.com");
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let response = app.clone().oneshot(builder.body(Body::from(body)).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).expect("error body is JSON");
    Reply { status, request_id: None, body }
}

#[tokio::test]
async fn malformed_input_is_a_json_validation_error() {
    let app = app();

    let reply = send(
        &app,
        Method::POST,
        "/conference",
        Some("ada"),
        Some(json!({ "name": "RustConf", "maxAttendees": -5 })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["errorCode"], "BAD_REQUEST");
    assert!(reply.body["error"]["message"].as_str().unwrap().contains("maxAttendees"));

    let reply = send_raw(&app, "/conference", Some("application/json"), "{\"name\": ").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["errorCode"], "BAD_REQUEST");

    let reply = send_raw(&app, "/conference", None, "{\"name\": \"RustConf\"}").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["errorCode"], "BAD_REQUEST");

    let reply =
        send_raw(&app, "/queryConferences", Some("application/json"), "{\"filters\": 3}").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(
        &app,
        Method::GET,
        "/conference/conf:1:ada/sessions/before/10:00?excludeType=a&excludeType=b",
        None,
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["errorCode"], "BAD_REQUEST");
}
