//! HTTP surface tests driven through the router without binding a socket.

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use quad::config::ServerConfig;
use quad::server::{AppState, create_router};
use quad::types::User;

use common::{Fixture, day};

fn router(fx: &Fixture) -> Router {
    let config = ServerConfig::default();
    create_router(Arc::new(AppState::new(fx.store.clone(), &config)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&User>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-Quad-User", &user.id);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: &Router, uri: &str, user: &User) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(user), None).await
}

#[tokio::test]
async fn health_needs_no_caller() {
    let fx = Fixture::new();
    let response = router(&fx)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn caller_header_is_required() {
    let fx = Fixture::new();
    let app = router(&fx);

    let (status, body) = send(&app, Method::GET, "/api/v1/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["data"].is_null());
    assert_eq!(body["error"], "Authentication required");

    let request = Request::get("/api/v1/me")
        .header("X-Quad-User", "ghost")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
}

#[tokio::test]
async fn search_endpoint_parses_query_string() {
    let fx = Fixture::new();
    let alice = fx.member("Alice");
    fx.thread_with(&alice, "Welcome to GU Drones", "", "drones", "intro,drones", day(1.0));
    fx.thread_with(&alice, "Welcome to Robotics", "", "robotics", "intro", day(2.0));
    let app = router(&fx);

    let (status, body) = get(&app, "/api/v1/search?type=title&query=Welcome", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["has_more"], false);
    assert_eq!(body["data"]["results"][0]["title"], "Welcome to Robotics");
    assert_eq!(body["data"]["results"][0]["author"]["name"], "Alice");

    let (_, body) = get(
        &app,
        "/api/v1/search?type=title&query=welcome&tags%5B%5D=intro&tags%5B%5D=drones",
        &alice,
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["results"][0]["section"], "drones");

    let (_, body) = get(
        &app,
        "/api/v1/search?type=title&query=welcome&section=drones&teamFilter=robotics",
        &alice,
    )
    .await;
    assert_eq!(body["data"]["results"][0]["section"], "robotics");

    let (_, body) = get(
        &app,
        "/api/v1/search?type=tags&query=nonexistent-tag",
        &alice,
    )
    .await;
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["results"], json!([]));
}

#[tokio::test]
async fn search_validation_errors_are_bad_requests() {
    let fx = Fixture::new();
    let alice = fx.member("Alice");
    let app = router(&fx);

    for uri in [
        "/api/v1/search?query=x",
        "/api/v1/search?type=title",
        "/api/v1/search?type=everything&query=x",
        "/api/v1/search?type=title&query=x&hasReplies=maybe",
    ] {
        let (status, body) = get(&app, uri, &alice).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn thread_lifecycle() {
    let fx = Fixture::new();
    let alice = fx.member("Alice");
    let bob = fx.member("Bob");
    let moderator = fx.user("Mod", &fx.moderator_role);
    let app = router(&fx);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/threads",
        Some(&alice),
        Some(json!({
            "title": "Welcome to GU Drones",
            "content": "Say hi",
            "section": "drones",
            "tags": ["intro", " drones "]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tags"], "intro,drones");
    let thread_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/threads/{thread_id}/replies"),
        Some(&bob),
        Some(json!({ "content": "Hi!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get(&app, &format!("/api/v1/threads/{thread_id}"), &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], 1);
    assert_eq!(body["data"]["author"]["name"], "Alice");
    assert_eq!(body["data"]["replies"][0]["author"]["name"], "Bob");

    let (_, body) = get(&app, "/api/v1/sections/drones/threads", &bob).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/threads/{thread_id}");
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&moderator), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &uri, &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn capabilities_gate_writes() {
    let fx = Fixture::new();
    let moderator = fx.user("Mod", &fx.moderator_role);
    let alice = fx.member("Alice");
    let thread = fx.thread(&alice, "Open", "general", day(1.0));
    let app = router(&fx);

    // Moderators may delete but not post.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/threads",
        Some(&moderator),
        Some(json!({ "title": "t", "content": "c", "section": "general" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Missing capability: can_create_threads");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/threads/{}/replies", thread.id),
        Some(&moderator),
        Some(json!({ "content": "c" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/threads/missing/replies",
        Some(&alice),
        Some(json!({ "content": "c" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/threads",
        Some(&alice),
        Some(json!({ "title": " ", "content": "c", "section": "general" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_visibility() {
    let fx = Fixture::new();
    let alice = fx.member("Alice");
    let bob = fx.member("Bob");
    let admin = fx.user("Admin", &fx.admin_role);
    let thread = fx.thread(&alice, "Hello", "general", day(1.0));
    fx.reply(&alice, &thread, "me again", day(1.5));
    let app = router(&fx);

    let (status, body) = get(&app, "/api/v1/me", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Alice");
    assert_eq!(body["data"]["role"]["name"], "member");
    assert_eq!(body["data"]["stats"]["total_threads"], 1);
    assert!(body["data"]["stats"]["metrics"].is_object());

    let uri = format!("/api/v1/users/{}", alice.id);
    let (_, body) = get(&app, &uri, &bob).await;
    assert_eq!(body["data"]["stats"]["total_replies"], 1);
    assert!(body["data"]["stats"].get("metrics").is_none());
    assert!(body["data"]["stats"].get("activity_map").is_none());

    let (_, body) = get(&app, &uri, &admin).await;
    assert_eq!(body["data"]["stats"]["activity_map"]["1970-01"], Value::Null);
    assert_eq!(body["data"]["stats"]["activity_map"]["2024-03"], 2);

    let (status, _) = get(&app, "/api/v1/users/nobody", &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, "/api/v1/me/stats", &bob).await;
    assert_eq!(body["data"]["total_threads"], 0);
    assert_eq!(body["data"]["metrics"]["last_active"], "1970-01-01T00:00:00Z");
}

#[tokio::test]
async fn profile_update() {
    let fx = Fixture::new();
    let alice = fx.member("Alice");
    let app = router(&fx);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/v1/me",
        Some(&alice),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/me",
        Some(&alice),
        Some(json!({ "bio": "Drone pilot" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bio"], "Drone pilot");

    let (_, body) = get(&app, "/api/v1/me", &alice).await;
    assert_eq!(body["data"]["bio"], "Drone pilot");
}

#[tokio::test]
async fn activity_feed_is_paged_and_clamped() {
    let fx = Fixture::new();
    let alice = fx.member("Alice");
    let t1 = fx.thread(&alice, "Day 1", "general", day(1.0));
    let t2 = fx.thread(&alice, "Day 2", "general", day(2.0));
    fx.thread(&alice, "Day 3", "general", day(3.0));
    fx.reply(&alice, &t1, "Day 1.5", day(1.5));
    fx.reply(&alice, &t2, "Day 2.5", day(2.5));
    let app = router(&fx);

    let base = format!("/api/v1/users/{}/activity", alice.id);

    let (status, body) = get(&app, &format!("{base}?page=1&page_size=2"), &alice).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total"], 5);
    assert_eq!(data["activities"][0]["type"], "thread");
    assert_eq!(data["activities"][0]["title"], "Day 3");
    assert_eq!(data["activities"][1]["type"], "reply");
    assert_eq!(data["activities"][1]["thread_title"], "Day 2");

    let (_, body) = get(&app, &format!("{base}?page=0&page_size=500"), &alice).await;
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["page_size"], 10);
    assert_eq!(body["data"]["activities"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn admin_routes_require_capabilities() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", &fx.admin_role);
    let moderator = fx.user("Mod", &fx.moderator_role);
    let alice = fx.member("Alice");
    let app = router(&fx);

    let (status, _) = get(&app, "/api/v1/admin/users", &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get(&app, "/api/v1/admin/users?page=1&page_size=2", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/roles",
        Some(&admin),
        Some(json!({
            "name": "ta",
            "color": "#3366FF",
            "capabilities": { "can_reply": true, "can_pin_threads": true }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["capabilities"]["can_reply"], true);
    assert_eq!(body["data"]["capabilities"]["can_manage_roles"], false);
    let role_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/admin/roles",
        Some(&admin),
        Some(json!({ "name": "ta", "color": "#3366FF" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/admin/roles",
        Some(&admin),
        Some(json!({ "name": "bad", "color": "#3366FF", "capabilities": { "can_fly": true } })),
    )
    .await;
    assert!(status.is_client_error());

    let uri = format!("/api/v1/admin/users/{}/role", alice.id);
    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&moderator),
        Some(json!({ "role_id": role_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let body = json!({ "role_id": role_id });
    let (status, body) = send(&app, Method::PUT, &uri, Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_id"], role_id);

    let (_, body) = get(&app, "/api/v1/roles", &alice).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}
