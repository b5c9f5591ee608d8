//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use chrono::Utc;
use http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use sessionhub_api::{AppState, build_router};
use sessionhub_auth::PasswordHasher;
use sessionhub_core::config::AppConfig;
use sessionhub_core::traits::ManualClock;
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_database::{Backends, UserRepository};
use sessionhub_entity::user::{User, UserRole};

/// Password every helper-created account uses.
pub const PASSWORD: &str = "password123";

/// Socket peer attached to requests that do not pick one.
pub const DEFAULT_PEER: &str = "127.0.0.1";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state behind the router
    pub state: AppState,
    /// Backing stores
    pub backends: Backends,
    /// Time source the whole app reads
    pub clock: Arc<ManualClock>,
}

/// Tokens and identifiers of one signed-in device.
#[derive(Debug, Clone)]
pub struct Device {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Session the tokens are bound to.
    pub session_id: SessionId,
    /// Raw login response body.
    pub body: Value,
}

impl TestApp {
    /// Create a new test application over in-memory stores with rate
    /// limiting switched off.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        Self::with_config(config)
    }

    /// Create a test application with an explicit configuration.
    pub fn with_config(config: AppConfig) -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let backends = Backends::memory();
        let state = AppState::new(config, backends.clone(), clock.clone());
        let router = build_router(state.clone());
        Self {
            router,
            state,
            backends,
            clock,
        }
    }

    /// Advance the application clock.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Create a STARTER account through the auth service.
    pub async fn create_user(&self, email: &str) -> UserId {
        self.state
            .auth_service
            .signup(email, PASSWORD)
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Create an account with an explicit role directly in the store.
    pub async fn create_user_with_role(&self, email: &str, role: UserRole) -> UserId {
        let user = User {
            id: UserId::new(),
            email: email.to_lowercase(),
            password_hash: PasswordHasher::new()
                .hash_password(PASSWORD)
                .expect("Failed to hash password"),
            role,
            created_at: Utc::now(),
        };
        self.backends
            .users
            .create(&user)
            .await
            .expect("Failed to insert test user");
        user.id
    }

    /// Log in over HTTP and return the new device's credentials.
    pub async fn login(&self, email: &str) -> Device {
        self.login_with_headers(email, &[]).await
    }

    /// Log in with extra headers such as `User-Agent`.
    pub async fn login_with_headers(&self, email: &str, headers: &[(&str, &str)]) -> Device {
        let response = self
            .request_with_headers(
                "POST",
                "/api/auth/login",
                Some(json!({ "email": email, "password": PASSWORD })),
                None,
                headers,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);

        let data = &response.body["data"];
        Device {
            access_token: data["access_token"].as_str().expect("access_token").to_string(),
            refresh_token: data["refresh_token"].as_str().expect("refresh_token").to_string(),
            session_id: data["session_id"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .expect("session_id"),
            body: response.body,
        }
    }

    /// Make a request to the test application.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_with_headers(method, path, body, token, &[]).await
    }

    /// Make a request with extra headers.
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.request_from(DEFAULT_PEER, method, path, body, token, headers)
            .await
    }

    /// Make a request arriving from socket address `peer`.
    pub async fn request_from(
        &self,
        peer: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let peer: IpAddr = peer.parse().expect("Invalid peer address");
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let mut req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(peer, 50_000)));

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Serve the router on an ephemeral local port.
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let app = self
            .router
            .clone()
            .into_make_service_with_connect_info::<SocketAddr>();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server failed");
        });
        addr
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON
    pub body: Value,
}

impl TestResponse {
    /// Machine code of an error response.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
