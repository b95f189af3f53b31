//! Integration tests for the WebSocket server.
//!
//! Route wiring is checked with oneshot requests; the event fan-out path is
//! exercised end to end (supervisor -> session manager -> session channel)
//! without a live socket, since sessions are addressable directly.

use std::io::Write;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::NamedTempFile;
use tokio::time::timeout;
use tower::ServiceExt;

use procdash_axum::bootstrap::{ServerConfig, build_context};
use procdash_axum::routes::create_router;
use procdash_core::protocol::ServerEvent;

fn test_config() -> (ServerConfig, NamedTempFile) {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(br#"{"gbc": {"path": "/bin/echo", "args": ["hello"]}}"#)
        .expect("write config");
    let config = ServerConfig {
        port: 0, // not used in tests
        config_path: Some(file.path().to_path_buf()),
    };
    (config, file)
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let (config, _file) = test_config();
    let ctx = build_context(&config).expect("bootstrap");
    let app = create_router(ctx);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn ws_route_requires_upgrade() {
    let (config, _file) = test_config();
    let ctx = build_context(&config).expect("bootstrap");
    let app = create_router(ctx);

    // plain GET without upgrade headers must be rejected, not served
    let response = app
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn bootstrap_fails_on_missing_config_file() {
    let config = ServerConfig {
        port: 0,
        config_path: Some("/nonexistent/procdash.json".into()),
    };
    assert!(build_context(&config).is_err());
}

#[tokio::test]
async fn subscribed_session_receives_lifecycle_events() {
    let (config, _file) = test_config();
    let ctx = build_context(&config).expect("bootstrap");

    let (session, mut rx) = ctx.sessions.register().await;
    ctx.sessions.join(session, "gbc").await;

    ctx.supervisor.start("gbc").await.expect("start gbc");

    let mut saw_log = false;
    let mut saw_exit = false;
    while !(saw_log && saw_exit) {
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("session channel closed");
        match event {
            ServerEvent::Starting { process_name, log } => {
                assert_eq!(process_name, "gbc");
                assert!(log.is_empty());
            }
            ServerEvent::Log { lines, .. } => {
                assert_eq!(lines, vec!["hello".to_string()]);
                saw_log = true;
            }
            ServerEvent::Exit { message, .. } => {
                assert_eq!(message, "Process exited with code: 0");
                saw_exit = true;
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

#[tokio::test]
async fn unsubscribed_session_sees_nothing() {
    let (config, _file) = test_config();
    let ctx = build_context(&config).expect("bootstrap");

    let (_session, mut rx) = ctx.sessions.register().await;
    ctx.supervisor.start("gbc").await.expect("start gbc");

    // give the lifecycle a moment to play out, then assert silence
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
}
