//! Integration tests for per-class rate limiting.

mod helpers;

use std::time::Duration;

use http::StatusCode;
use serde_json::json;

use helpers::TestApp;
use sessionhub_core::config::AppConfig;
use sessionhub_core::config::rate_limit::RateRule;

fn limited_app(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let mut config = AppConfig::default();
    configure(&mut config);
    TestApp::with_config(config)
}

async fn bad_login(app: &TestApp, ip: &str) -> helpers::TestResponse {
    bad_login_via(app, ip, &[]).await
}

async fn bad_login_via(
    app: &TestApp,
    peer: &str,
    headers: &[(&str, &str)],
) -> helpers::TestResponse {
    app.request_from(
        peer,
        "POST",
        "/api/auth/login",
        Some(json!({ "email": "target@example.com", "password": "guess" })),
        None,
        headers,
    )
    .await
}

#[tokio::test]
async fn test_auth_class_counts_every_attempt_per_ip() {
    let app = limited_app(|_| {});
    app.create_user("target@example.com").await;

    for _ in 0..5 {
        let response = bad_login(&app, "198.51.100.1").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let blocked = bad_login(&app, "198.51.100.1").await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(blocked.error_code(), "RATE_LIMITED");
    let retry_after: u64 = blocked
        .headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("Retry-After header");
    assert!(retry_after > 0 && retry_after <= 15 * 60);
    assert_eq!(blocked.body["details"]["retry_after_secs"], retry_after);

    let other_ip = bad_login(&app, "198.51.100.2").await;
    assert_eq!(other_ip.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forwarded_for_from_untrusted_peer_is_ignored() {
    let app = limited_app(|_| {});
    app.create_user("target@example.com").await;

    for i in 0..5 {
        let spoofed = format!("203.0.113.{i}");
        let response = bad_login_via(&app, "198.51.100.20", &[("x-forwarded-for", spoofed.as_str())]).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let blocked = bad_login_via(&app, "198.51.100.20", &[("x-forwarded-for", "203.0.113.99")]).await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_forwarded_for_from_trusted_proxy_keys_each_client() {
    let app = limited_app(|config| {
        config.server.trusted_proxies = vec!["10.0.0.2".parse().unwrap()];
    });
    app.create_user("target@example.com").await;

    for _ in 0..5 {
        bad_login_via(&app, "10.0.0.2", &[("x-forwarded-for", "203.0.113.1")]).await;
    }
    let blocked = bad_login_via(&app, "10.0.0.2", &[("x-forwarded-for", "203.0.113.1")]).await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);

    let other_client = bad_login_via(&app, "10.0.0.2", &[("x-forwarded-for", "203.0.113.2")]).await;
    assert_eq!(other_client.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_window_resets() {
    let app = limited_app(|_| {});
    app.create_user("target@example.com").await;

    for _ in 0..5 {
        bad_login(&app, "198.51.100.9").await;
    }
    assert_eq!(
        bad_login(&app, "198.51.100.9").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    app.advance(Duration::from_secs(15 * 60 + 1));
    assert_eq!(
        bad_login(&app, "198.51.100.9").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_general_class_counts_only_failures() {
    let app = limited_app(|config| {
        config.rate_limit.general = RateRule {
            window: Duration::from_secs(60),
            limit: 3,
        };
    });
    app.create_user("poll@example.com").await;
    let device = app.login("poll@example.com").await;

    for _ in 0..20 {
        let response = app
            .request(
                "GET",
                "/api/auth/session-status",
                None,
                Some(&device.access_token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    for _ in 0..3 {
        let response = app
            .request_from("192.0.2.44", "GET", "/api/account", None, Some("junk"), &[])
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    let blocked = app
        .request_from("192.0.2.44", "GET", "/api/account", None, Some("junk"), &[])
        .await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);

    let unaffected = app
        .request("GET", "/api/account", None, Some(&device.access_token))
        .await;
    assert_eq!(unaffected.status, StatusCode::OK);
}

#[tokio::test]
async fn test_session_management_keyed_by_user() {
    let app = limited_app(|config| {
        config.rate_limit.auth.limit = 100;
        config.rate_limit.session_management = RateRule {
            window: Duration::from_secs(60),
            limit: 2,
        };
    });
    app.create_user("one@example.com").await;
    app.create_user("two@example.com").await;
    let one = app.login("one@example.com").await;
    let two = app.login("two@example.com").await;

    for _ in 0..2 {
        let ok = app
            .request("GET", "/api/sessions", None, Some(&one.access_token))
            .await;
        assert_eq!(ok.status, StatusCode::OK);
    }
    let blocked = app
        .request("GET", "/api/sessions", None, Some(&one.access_token))
        .await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);

    // Same address, different identity.
    let other = app
        .request("GET", "/api/sessions", None, Some(&two.access_token))
        .await;
    assert_eq!(other.status, StatusCode::OK);
}

#[tokio::test]
async fn test_mutation_class_counts_all_attempts() {
    let app = limited_app(|config| {
        config.rate_limit.mutation = RateRule {
            window: Duration::from_secs(60),
            limit: 2,
        };
    });
    for _ in 0..2 {
        let response = app
            .request_from(
                "192.0.2.80",
                "POST",
                "/api/auth/refresh",
                Some(json!({ "refresh_token": "unknown" })),
                None,
                &[],
            )
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
    let blocked = app
        .request_from(
            "192.0.2.80",
            "POST",
            "/api/auth/refresh",
            Some(json!({ "refresh_token": "unknown" })),
            None,
            &[],
        )
        .await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health_is_not_limited() {
    let app = limited_app(|config| {
        config.rate_limit.general.limit = 0;
    });
    for _ in 0..10 {
        let response = app.request("GET", "/api/health", None, None).await;
        assert_eq!(response.status, StatusCode::OK);
    }
}
