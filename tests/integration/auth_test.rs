//! Integration tests for signup, login, token refresh and logout.

mod helpers;

use std::time::Duration;

use http::StatusCode;
use serde_json::json;

use helpers::{PASSWORD, TestApp};
use sessionhub_entity::user::UserRole;

#[tokio::test]
async fn test_signup_then_login() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "Alice@Example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["email"], "alice@example.com");
    assert_eq!(response.body["data"]["role"], "STARTER");
    assert!(response.body["data"].get("password_hash").is_none());

    let device = app.login("alice@example.com").await;
    assert!(!device.access_token.is_empty());
    assert!(!device.refresh_token.is_empty());
    assert_eq!(device.body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(device.body["data"]["evicted_sessions"], json!([]));

    let account = app
        .request("GET", "/api/account", None, Some(&device.access_token))
        .await;
    assert_eq!(account.status, StatusCode::OK);
    assert_eq!(account.body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    app.create_user("bob@example.com").await;

    let dup = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "BOB@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.error_code(), "CONFLICT");

    let short = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "carol@example.com", "password": "short" })),
            None,
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.error_code(), "VALIDATION_ERROR");

    let malformed = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "carol@example.com" })),
            None,
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = TestApp::new();
    app.create_user("dave@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "dave@example.com", "password": "wrongpassword" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_CREDENTIALS");

    let unknown = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.error_code(), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_missing_and_invalid_tokens() {
    let app = TestApp::new();

    let none = app.request("GET", "/api/account", None, None).await;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);
    assert_eq!(none.error_code(), "NO_TOKEN");

    let junk = app
        .request("GET", "/api/account", None, Some("not.a.jwt"))
        .await;
    assert_eq!(junk.status, StatusCode::UNAUTHORIZED);
    assert_eq!(junk.error_code(), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_idle_session_expires_before_access_token() {
    let app = TestApp::new();
    app.create_user("erin@example.com").await;
    let device = app.login("erin@example.com").await;

    app.advance(Duration::from_secs(6 * 60));

    let response = app
        .request("GET", "/api/account", None, Some(&device.access_token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_activity_slides_the_session_deadline() {
    let app = TestApp::new();
    app.create_user("frank@example.com").await;
    let device = app.login("frank@example.com").await;

    for _ in 0..4 {
        app.advance(Duration::from_secs(3 * 60));
        let response = app
            .request(
                "GET",
                "/api/auth/session-status",
                None,
                Some(&device.access_token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["data"]["remaining_seconds"], 300);
    }
}

#[tokio::test]
async fn test_access_token_expires_after_ttl() {
    let app = TestApp::new();
    app.create_user("gina@example.com").await;
    let device = app.login("gina@example.com").await;

    // Keep the session alive while the 15 minute access token runs out.
    for _ in 0..3 {
        app.advance(Duration::from_secs(4 * 60));
        let response = app
            .request("GET", "/api/account", None, Some(&device.access_token))
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    app.advance(Duration::from_secs(4 * 60));
    let response = app
        .request("GET", "/api/account", None, Some(&device.access_token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_refresh_rotates_single_use_tokens() {
    let app = TestApp::new();
    app.create_user("hank@example.com").await;
    let device = app.login("hank@example.com").await;

    let first = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": device.refresh_token })),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let data = &first.body["data"];
    assert_eq!(data["session_id"], device.session_id.to_string());
    let new_access = data["access_token"].as_str().unwrap().to_string();
    let new_refresh = data["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, device.refresh_token);

    let reuse = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": device.refresh_token })),
            None,
        )
        .await;
    assert_eq!(reuse.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reuse.error_code(), "TOKEN_REVOKED");

    let account = app
        .request("GET", "/api/account", None, Some(&new_access))
        .await;
    assert_eq!(account.status, StatusCode::OK);

    let second = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": new_refresh })),
            None,
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_unknown_token_is_not_found() {
    let app = TestApp::new();
    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": "does-not-exist" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_refresh_for_idle_session_is_session_expired() {
    let app = TestApp::new();
    app.create_user("ivy@example.com").await;
    let device = app.login("ivy@example.com").await;

    app.advance(Duration::from_secs(6 * 60));

    let response = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": device.refresh_token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_logout_ends_session_and_refresh() {
    let app = TestApp::new();
    app.create_user("jack@example.com").await;
    let device = app.login("jack@example.com").await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&device.access_token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let account = app
        .request("GET", "/api/account", None, Some(&device.access_token))
        .await;
    assert_eq!(account.status, StatusCode::UNAUTHORIZED);
    assert_eq!(account.error_code(), "SESSION_EXPIRED");

    let refresh = app
        .request(
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": device.refresh_token })),
            None,
        )
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);
    assert_eq!(refresh.error_code(), "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_export_requires_pro() {
    let app = TestApp::new();
    app.create_user("kim@example.com").await;
    app.create_user_with_role("lee@example.com", UserRole::Pro)
        .await;

    let starter = app.login("kim@example.com").await;
    let denied = app
        .request(
            "GET",
            "/api/account/export",
            None,
            Some(&starter.access_token),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.error_code(), "FORBIDDEN");
    assert_eq!(denied.body["details"]["required_roles"], json!(["PRO"]));
    assert_eq!(denied.body["details"]["actual_role"], "STARTER");

    let pro = app.login("lee@example.com").await;
    let allowed = app
        .request("GET", "/api/account/export", None, Some(&pro.access_token))
        .await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["data"]["user"]["role"], "PRO");
    assert_eq!(allowed.body["data"]["active_sessions"], 1);
}

#[tokio::test]
async fn test_health_reports_backend() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["database"], "memory");
    assert_eq!(response.body["data"]["ws_connections"], 0);
}
