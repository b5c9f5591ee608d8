//! Integration tests for multi-device session management.

mod helpers;

use std::time::Duration;

use futures::future::join_all;
use http::StatusCode;
use serde_json::json;

use helpers::TestApp;
use sessionhub_core::config::AppConfig;

const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";

fn capped(max_per_user: u32) -> TestApp {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config.session.max_per_user = max_per_user;
    TestApp::with_config(config)
}

#[tokio::test]
async fn test_list_sessions_flags_current_device() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config.server.trusted_proxies = vec![helpers::DEFAULT_PEER.parse().unwrap()];
    let app = TestApp::with_config(config);
    app.create_user("ann@example.com").await;

    let laptop = app
        .login_with_headers(
            "ann@example.com",
            &[("user-agent", FIREFOX_LINUX), ("x-forwarded-for", "203.0.113.7")],
        )
        .await;
    app.advance(Duration::from_secs(1));
    let phone = app
        .login_with_headers("ann@example.com", &[("user-agent", SAFARI_IPHONE)])
        .await;

    let response = app
        .request("GET", "/api/sessions", None, Some(&phone.access_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let sessions = response.body["data"].as_array().expect("session list");
    assert_eq!(sessions.len(), 2);

    assert_eq!(sessions[0]["id"], laptop.session_id.to_string());
    assert_eq!(sessions[0]["current"], false);
    assert_eq!(sessions[0]["ip_address"], "203.0.113.7");
    assert_eq!(sessions[0]["device_info"]["browser"], "Firefox");
    assert_eq!(sessions[0]["device_info"]["device_type"], "desktop");

    assert_eq!(sessions[1]["id"], phone.session_id.to_string());
    assert_eq!(sessions[1]["current"], true);
    assert_eq!(sessions[1]["ip_address"], helpers::DEFAULT_PEER);
    assert_eq!(sessions[1]["device_info"]["os"], "iOS");
    assert_eq!(sessions[1]["device_info"]["device_type"], "mobile");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_respect_cap() {
    let app = capped(3);
    let user_id = app.create_user("rush@example.com").await;

    let devices = join_all((0..8).map(|_| app.login("rush@example.com"))).await;

    let evicted: usize = devices
        .iter()
        .map(|d| d.body["data"]["evicted_sessions"].as_array().map_or(0, Vec::len))
        .sum();
    assert_eq!(evicted, 5);
    assert_eq!(app.state.sessions.count_by_user(user_id).await.unwrap(), 3);

    let survivors = devices
        .iter()
        .filter(|d| {
            !devices.iter().any(|other| {
                other.body["data"]["evicted_sessions"]
                    .as_array()
                    .is_some_and(|ids| ids.contains(&json!(d.session_id.to_string())))
            })
        })
        .count();
    assert_eq!(survivors, 3);
}

#[tokio::test]
async fn test_login_over_cap_evicts_oldest() {
    let app = capped(2);
    let user_id = app.create_user("ben@example.com").await;

    let first = app.login("ben@example.com").await;
    app.advance(Duration::from_secs(1));
    let second = app.login("ben@example.com").await;
    app.advance(Duration::from_secs(1));
    let third = app.login("ben@example.com").await;

    assert_eq!(
        third.body["data"]["evicted_sessions"],
        json!([first.session_id.to_string()])
    );
    assert_eq!(app.state.sessions.count_by_user(user_id).await.unwrap(), 2);

    let evicted = app
        .request("GET", "/api/account", None, Some(&first.access_token))
        .await;
    assert_eq!(evicted.status, StatusCode::UNAUTHORIZED);
    assert_eq!(evicted.error_code(), "SESSION_EXPIRED");

    let refresh = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": first.refresh_token })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    assert_eq!(refresh.error_code(), "TOKEN_REVOKED");

    for device in [&second, &third] {
        let ok = app
            .request("GET", "/api/account", None, Some(&device.access_token))
            .await;
        assert_eq!(ok.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_refresh_does_not_count_against_cap() {
    let app = capped(1);
    let user_id = app.create_user("cat@example.com").await;
    let device = app.login("cat@example.com").await;

    let mut refresh_token = device.refresh_token.clone();
    let mut access_token = device.access_token.clone();
    for _ in 0..3 {
        let response = app
            .request(
                "POST",
                "/api/auth/refresh",
                Some(json!({ "refresh_token": refresh_token })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let data = &response.body["data"];
        assert_eq!(data["session_id"], device.session_id.to_string());
        refresh_token = data["refresh_token"].as_str().unwrap().to_string();
        access_token = data["access_token"].as_str().unwrap().to_string();
    }

    assert_eq!(app.state.sessions.count_by_user(user_id).await.unwrap(), 1);
    let account = app
        .request("GET", "/api/account", None, Some(&access_token))
        .await;
    assert_eq!(account.status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_all_except_current() {
    let app = TestApp::new();
    app.create_user("dan@example.com").await;
    let device_a = app.login("dan@example.com").await;
    app.advance(Duration::from_secs(1));
    let device_b = app.login("dan@example.com").await;
    app.advance(Duration::from_secs(1));
    let device_c = app.login("dan@example.com").await;

    let response = app
        .request("DELETE", "/api/sessions", None, Some(&device_a.access_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let mut deleted: Vec<String> = response.body["data"]["deleted"]
        .as_array()
        .expect("deleted list")
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    deleted.sort();
    let mut expected = vec![device_b.session_id.to_string(), device_c.session_id.to_string()];
    expected.sort();
    assert_eq!(deleted, expected);

    for device in [&device_b, &device_c] {
        let gone = app
            .request("GET", "/api/account", None, Some(&device.access_token))
            .await;
        assert_eq!(gone.error_code(), "SESSION_EXPIRED");
    }

    let still = app
        .request("GET", "/api/sessions", None, Some(&device_a.access_token))
        .await;
    assert_eq!(still.status, StatusCode::OK);
    assert_eq!(still.body["data"].as_array().unwrap().len(), 1);

    let again = app
        .request("DELETE", "/api/sessions", None, Some(&device_a.access_token))
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["data"]["deleted"], json!([]));
}

#[tokio::test]
async fn test_delete_one_session_is_idempotent() {
    let app = TestApp::new();
    app.create_user("eve@example.com").await;
    let device_a = app.login("eve@example.com").await;
    let device_b = app.login("eve@example.com").await;

    let path = format!("/api/sessions/{}", device_b.session_id);
    let first = app
        .request("DELETE", &path, None, Some(&device_a.access_token))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(
        first.body["data"]["deleted"],
        json!([device_b.session_id.to_string()])
    );

    let second = app
        .request("DELETE", &path, None, Some(&device_a.access_token))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["data"]["deleted"], json!([]));

    let gone = app
        .request("GET", "/api/account", None, Some(&device_b.access_token))
        .await;
    assert_eq!(gone.error_code(), "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_cannot_delete_another_users_session() {
    let app = TestApp::new();
    app.create_user("fay@example.com").await;
    app.create_user("gus@example.com").await;
    let fay = app.login("fay@example.com").await;
    let gus = app.login("gus@example.com").await;

    let response = app
        .request(
            "DELETE",
            &format!("/api/sessions/{}", gus.session_id),
            None,
            Some(&fay.access_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["deleted"], json!([]));

    let intact = app
        .request("GET", "/api/account", None, Some(&gus.access_token))
        .await;
    assert_eq!(intact.status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_with_malformed_id() {
    let app = TestApp::new();
    app.create_user("hal@example.com").await;
    let device = app.login("hal@example.com").await;

    let response = app
        .request(
            "DELETE",
            "/api/sessions/not-a-uuid",
            None,
            Some(&device.access_token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_session_lifetime_ceiling() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config.session.lifetime = Duration::from_secs(12 * 60);
    config.auth.access_token_ttl = Duration::from_secs(60 * 60);
    let app = TestApp::with_config(config);
    app.create_user("ida@example.com").await;
    let device = app.login("ida@example.com").await;

    for _ in 0..2 {
        app.advance(Duration::from_secs(4 * 60));
        let ok = app
            .request("GET", "/api/account", None, Some(&device.access_token))
            .await;
        assert_eq!(ok.status, StatusCode::OK);
    }

    let status = app
        .request(
            "GET",
            "/api/auth/session-status",
            None,
            Some(&device.access_token),
        )
        .await;
    assert_eq!(status.body["data"]["remaining_seconds"], 4 * 60);

    app.advance(Duration::from_secs(4 * 60 + 1));
    let expired = app
        .request("GET", "/api/account", None, Some(&device.access_token))
        .await;
    assert_eq!(expired.error_code(), "SESSION_EXPIRED");
}
