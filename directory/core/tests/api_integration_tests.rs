// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use aegis_directory::application::coordinator::DirectoryCoordinator;
use aegis_directory::application::directory_service::{DirectoryService, StandardDirectoryService};
use aegis_directory::domain::community::{directory_jid, AgentJid};
use aegis_directory::infrastructure::event_bus::EventBus;
use aegis_directory::infrastructure::room_roster::{InMemoryRoomRoster, RoomRoster, RosterError};
use aegis_directory::presentation::api::{app, SENDER_HEADER};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct UnreachableRoster;

#[async_trait]
impl RoomRoster for UnreachableRoster {
    async fn occupants(&self, _room: &str) -> Result<Vec<AgentJid>, RosterError> {
        Err(RosterError::Unavailable("connection refused".to_string()))
    }
}

fn service_with(roster: Arc<dyn RoomRoster>) -> Arc<StandardDirectoryService> {
    let (handle, _worker) = DirectoryCoordinator::spawn(32, EventBus::new(64));
    Arc::new(StandardDirectoryService::new(handle, roster, directory_jid("localhost")))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn membership(sender: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/communities/membership")
        .header("content-type", "application/json")
        .header(SENDER_HEADER, sender)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn search(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/communities/search")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn membership_search_and_groups_round_trip() {
    let service = service_with(Arc::new(InMemoryRoomRoster::new()));
    let router = app(service.clone(), true);

    let (status, _) = send(
        &router,
        membership("u1@localhost", json!({"path": "peak/a0/b0", "domain": "localhost", "tags": ["t1"]})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = send(
        &router,
        membership("u2@localhost", json!({"path": "peak/a0", "domain": "localhost"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    service.handle().flush().await.unwrap();

    let (status, body) = send(&router, search(json!({"tags": ["t1"]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"communities": ["b0"]}));

    let (status, body) = send(&router, get("/groups")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["nodes"],
        json!([
            ["a0", "level1", "localhost"],
            ["b0", "level2", "localhost"],
            ["peak", "level0", "localhost"]
        ])
    );
    assert_eq!(body["links"], json!([["a0", "b0"], ["peak", "a0"]]));
    assert_eq!(body["node_members"]["a0"], json!(["u2@localhost"]));

    let (status, _) = send(
        &router,
        membership(
            "u1@localhost",
            json!({"path": "peak/a0/b0", "domain": "localhost", "leave": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    service.handle().flush().await.unwrap();

    let (_, body) = send(&router, search(json!({"tags": ["t1"]}))).await;
    assert_eq!(body, json!({"communities": []}));

    let (_, body) = send(&router, get("/groups")).await;
    assert_eq!(body["categories"], json!(["level0", "level1"]));
}

#[tokio::test]
async fn malformed_requests_are_rejected_with_bad_request() {
    let service = service_with(Arc::new(InMemoryRoomRoster::new()));
    let router = app(service.clone(), false);

    let (status, body) = send(
        &router,
        membership("u1@localhost", json!({"path": "a//b", "domain": "localhost"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("path"));

    let (status, _) = send(&router, membership("u1@localhost", json!({"domain": "localhost"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, search(json!({"tags": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    service.handle().flush().await.unwrap();
    assert!(service.groups().await.nodes.is_empty());
}

#[tokio::test]
async fn refresh_reports_live_occupancy() {
    let roster = InMemoryRoomRoster::new();
    roster.enter("lobby@localhost", directory_jid("localhost")).await;
    roster.enter("lobby@localhost", AgentJid::from("u1@localhost")).await;
    roster.enter("lobby@localhost", AgentJid::from("u5@localhost")).await;
    let service = service_with(Arc::new(roster));
    let router = app(service.clone(), false);

    send(&router, membership("u1@localhost", json!({"path": "lobby", "domain": "localhost"}))).await;
    service.handle().flush().await.unwrap();

    let (status, body) = send(&router, get("/groups/refresh")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node_members"], json!({"lobby": 2}));

    // Refresh leaves recorded membership untouched.
    let (_, body) = send(&router, get("/groups")).await;
    assert_eq!(body["node_members"], json!({"lobby": ["u1@localhost"]}));
}

#[tokio::test]
async fn refresh_surfaces_transport_failure() {
    let service = service_with(Arc::new(UnreachableRoster));
    let router = app(service.clone(), false);

    send(&router, membership("u1@localhost", json!({"path": "lobby", "domain": "localhost"}))).await;
    service.handle().flush().await.unwrap();

    let (status, body) = send(&router, get("/groups/refresh")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn leave_from_non_member_joins_the_leaf() {
    let service = service_with(Arc::new(InMemoryRoomRoster::new()));
    let router = app(service.clone(), false);

    send(&router, membership("u1@localhost", json!({"path": "a/b", "domain": "localhost"}))).await;
    service.handle().flush().await.unwrap();

    let (status, _) = send(
        &router,
        membership("stranger@localhost", json!({"path": "a/b", "domain": "localhost", "leave": true})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    service.handle().flush().await.unwrap();

    let (_, body) = send(&router, get("/groups")).await;
    assert_eq!(body["node_members"]["b"], json!(["u1@localhost", "stranger@localhost"]));
}
