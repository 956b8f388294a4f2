//! Tests for connection-time authentication on the real-time channel and
//! the inbox API.
//!
//! A bad or missing credential must terminate the WebSocket upgrade attempt
//! with 401 *before* any connection state or topic subscription is created.
//! The WebSocket tests drive a real server on an ephemeral port with a raw
//! TCP handshake; the inbox tests use `oneshot`. The pool is created lazily
//! and no database is touched on any of these paths.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

use nephra_api::auth::jwt::generate_access_token;
use nephra_api::ws::WsManager;

/// Start the full app on an ephemeral port.
async fn spawn_server() -> (SocketAddr, Arc<WsManager>) {
    let (app, ws_manager) = common::build_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, ws_manager)
}

/// Perform a raw WebSocket opening handshake and return the HTTP status line.
///
/// Keeps the stream alive (returned to the caller) so an accepted connection
/// stays registered while assertions run.
async fn ws_handshake(addr: SocketAddr, path: &str) -> (String, TcpStream) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: localhost\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
         \r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await.unwrap();
    let response = String::from_utf8_lossy(&buf[..n]).to_string();
    let status_line = response.lines().next().unwrap_or_default().to_string();
    (status_line, stream)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Test: missing token is rejected before any subscription occurs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ws_upgrade_without_token_is_rejected() {
    let (addr, ws_manager) = spawn_server().await;

    let (status_line, _stream) = ws_handshake(addr, "/api/v1/ws").await;

    assert!(
        status_line.contains("401"),
        "Expected 401, got: {status_line}"
    );
    // No connection was registered, so no topic subscription exists.
    assert_eq!(ws_manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: garbage token is rejected with 401
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ws_upgrade_with_invalid_token_is_rejected() {
    let (addr, ws_manager) = spawn_server().await;

    let (status_line, _stream) = ws_handshake(addr, "/api/v1/ws?token=not-a-real-jwt").await;

    assert!(
        status_line.contains("401"),
        "Expected 401, got: {status_line}"
    );
    assert_eq!(ws_manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: a validly signed token passes the credential check and registers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ws_upgrade_with_valid_token_is_accepted() {
    let (addr, ws_manager) = spawn_server().await;

    let token = generate_access_token(7, "doctor", &common::test_config().jwt).unwrap();
    let (status_line, _stream) = ws_handshake(addr, &format!("/api/v1/ws?token={token}")).await;

    assert!(
        status_line.contains("101"),
        "Expected 101 Switching Protocols, got: {status_line}"
    );

    // The connection registers (and auto-subscribes its topics) shortly
    // after the handshake completes.
    let mut registered = false;
    for _ in 0..50 {
        if ws_manager.connection_count().await == 1 {
            registered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(registered, "Connection should register after handshake");
}

// ---------------------------------------------------------------------------
// Test: inbox endpoints require a bearer token
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inbox_without_auth_header_is_rejected() {
    let (app, _) = common::build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/notifications/unread-count")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Test: broadcast requires the admin role
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_with_clinical_role_is_forbidden() {
    let (app, _) = common::build_test_app();

    let token = generate_access_token(7, "doctor", &common::test_config().jwt).unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/notifications/broadcast")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "FORBIDDEN");
}
