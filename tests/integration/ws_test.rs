//! Integration tests for the WebSocket push channel.

mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use http::StatusCode;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use helpers::TestApp;
use sessionhub_core::config::AppConfig;
use sessionhub_realtime::{ForceLogoutReason, ServerEvent, should_honor};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, token: &str) -> Socket {
    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?token={token}"))
        .await
        .expect("WebSocket connect failed");
    match next_event(&mut socket).await {
        ServerEvent::Authenticated { .. } => socket,
        other => panic!("expected authenticated, got {other:?}"),
    }
}

/// Next non-heartbeat event, failing after a few seconds.
async fn next_event(socket: &mut Socket) -> ServerEvent {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = frame {
            let event: ServerEvent = serde_json::from_str(text.as_str()).expect("event json");
            if !matches!(event, ServerEvent::Heartbeat { .. }) {
                return event;
            }
        }
    }
}

#[tokio::test]
async fn test_query_token_authenticates() {
    let app = TestApp::new();
    let user_id = app.create_user("ws1@example.com").await;
    let device = app.login("ws1@example.com").await;
    let addr = app.spawn_server().await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?token={}", device.access_token))
        .await
        .expect("connect");
    match next_event(&mut socket).await {
        ServerEvent::Authenticated {
            user_id: got_user,
            session_id,
        } => {
            assert_eq!(got_user, user_id);
            assert_eq!(session_id, device.session_id);
        }
        other => panic!("unexpected event {other:?}"),
    }

    assert_eq!(app.state.realtime.registry.connections_for(user_id), 1);
}

#[tokio::test]
async fn test_bad_query_token_is_rejected_before_upgrade() {
    let app = TestApp::new();
    let addr = app.spawn_server().await;

    let err = connect_async(format!("ws://{addr}/ws?token=garbage"))
        .await
        .expect_err("upgrade should fail");
    match err {
        WsError::Http(response) => assert_eq!(response.status(), StatusCode::UNAUTHORIZED),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_first_frame_authentication() {
    let app = TestApp::new();
    app.create_user("ws2@example.com").await;
    let device = app.login("ws2@example.com").await;
    let addr = app.spawn_server().await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    let hello = serde_json::json!({ "type": "authenticate", "token": device.access_token });
    socket
        .send(Message::Text(hello.to_string().into()))
        .await
        .expect("send");

    match next_event(&mut socket).await {
        ServerEvent::Authenticated { session_id, .. } => {
            assert_eq!(session_id, device.session_id)
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_first_frame_with_bad_token_gets_error() {
    let app = TestApp::new();
    let addr = app.spawn_server().await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    let hello = serde_json::json!({ "type": "authenticate", "token": "garbage" });
    socket
        .send(Message::Text(hello.to_string().into()))
        .await
        .expect("send");

    match next_event(&mut socket).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, "INVALID_TOKEN"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_handshake_times_out() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config.realtime.handshake_timeout = Duration::from_millis(200);
    let app = TestApp::with_config(config);
    let addr = app.spawn_server().await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.expect("connect");
    match next_event(&mut socket).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, "NO_TOKEN"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_all_devices_reaches_other_devices_only() {
    let app = TestApp::new();
    app.create_user("ws3@example.com").await;
    let device_a = app.login("ws3@example.com").await;
    let device_b = app.login("ws3@example.com").await;
    let addr = app.spawn_server().await;

    let mut socket_a = connect(addr, &device_a.access_token).await;
    let mut socket_b = connect(addr, &device_b.access_token).await;

    let response = app
        .request("DELETE", "/api/sessions", None, Some(&device_a.access_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let on_b = next_event(&mut socket_b).await;
    match &on_b {
        ServerEvent::ForceLogout {
            reason,
            exclude_session_token,
            ..
        } => {
            assert_eq!(*reason, ForceLogoutReason::LogoutAllDevices);
            assert_eq!(*exclude_session_token, Some(device_a.session_id));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(should_honor(&on_b, device_b.session_id));

    let on_a = next_event(&mut socket_a).await;
    assert!(matches!(on_a, ServerEvent::ForceLogout { .. }));
    assert!(!should_honor(&on_a, device_a.session_id));

    assert!(matches!(
        next_event(&mut socket_a).await,
        ServerEvent::SessionUpdate {}
    ));
    assert!(matches!(
        next_event(&mut socket_b).await,
        ServerEvent::SessionUpdate {}
    ));
}

#[tokio::test]
async fn test_eviction_targets_evicted_device() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config.session.max_per_user = 1;
    let app = TestApp::with_config(config);
    app.create_user("ws4@example.com").await;
    let old = app.login("ws4@example.com").await;
    let addr = app.spawn_server().await;
    let mut socket = connect(addr, &old.access_token).await;

    app.advance(Duration::from_secs(1));
    let new = app.login("ws4@example.com").await;

    let event = next_event(&mut socket).await;
    match &event {
        ServerEvent::ForceLogout {
            reason, session_id, ..
        } => {
            assert_eq!(*reason, ForceLogoutReason::DeviceLogout);
            assert_eq!(*session_id, Some(old.session_id));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(should_honor(&event, old.session_id));
    assert!(!should_honor(&event, new.session_id));
}

#[tokio::test]
async fn test_closed_socket_is_unregistered() {
    let app = TestApp::new();
    let user_id = app.create_user("ws5@example.com").await;
    let device = app.login("ws5@example.com").await;
    let addr = app.spawn_server().await;

    let mut socket = connect(addr, &device.access_token).await;
    assert_eq!(app.state.realtime.registry.connections_for(user_id), 1);

    socket.close(None).await.expect("close");
    drop(socket);

    for _ in 0..50 {
        if app.state.realtime.registry.connections_for(user_id) == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("connection was not unregistered");
}
