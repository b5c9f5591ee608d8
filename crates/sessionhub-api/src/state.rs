//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use tracing::info;

use sessionhub_auth::{RateLimiter, RequestPipeline, SessionStore, TokenService};
use sessionhub_core::config::AppConfig;
use sessionhub_core::traits::Clock;
use sessionhub_database::{Backends, DatabasePool};
use sessionhub_realtime::RealtimeEngine;
use sessionhub_service::{AuthService, SessionService};
use sessionhub_worker::{ExpirationSweeper, HeartbeatJob};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// PostgreSQL pool, when that backend is selected
    pub db_pool: Option<DatabasePool>,

    // ── Session engine ───────────────────────────────────────
    /// Token issuance and verification
    pub tokens: Arc<TokenService>,
    /// Session records
    pub sessions: Arc<SessionStore>,
    /// Per-class request budgets
    pub rate_limiter: Arc<RateLimiter>,
    /// Authenticate, rate-limit and authorize
    pub pipeline: Arc<RequestPipeline>,
    /// WebSocket registry and broadcast
    pub realtime: RealtimeEngine,

    // ── Services ─────────────────────────────────────────────
    /// Signup, login, refresh, logout
    pub auth_service: Arc<AuthService>,
    /// Session management
    pub session_service: Arc<SessionService>,
}

impl AppState {
    /// Wires every component over the given stores.
    pub fn new(config: AppConfig, backends: Backends, clock: Arc<dyn Clock>) -> Self {
        let tokens = Arc::new(TokenService::new(
            &config.auth,
            Arc::clone(&backends.refresh_tokens),
            Arc::clone(&backends.users),
            Arc::clone(&clock),
        ));
        let sessions = Arc::new(SessionStore::new(
            &config.session,
            Arc::clone(&backends.sessions),
            Arc::clone(&clock),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit, Arc::clone(&clock)));
        let pipeline = Arc::new(RequestPipeline::new(
            Arc::clone(&tokens),
            Arc::clone(&sessions),
            Arc::clone(&rate_limiter),
        ));
        let realtime = RealtimeEngine::new(&config.realtime, Arc::clone(&pipeline));

        let auth_service = Arc::new(AuthService::new(
            &config.auth,
            Arc::clone(&backends.users),
            Arc::clone(&tokens),
            Arc::clone(&sessions),
            Arc::clone(&realtime.dispatcher),
            Arc::clone(&clock),
        ));
        let session_service = Arc::new(SessionService::new(
            Arc::clone(&sessions),
            Arc::clone(&tokens),
            Arc::clone(&realtime.dispatcher),
            Arc::clone(&clock),
        ));

        info!(
            max_sessions_per_user = config.session.max_per_user,
            session_timeout_secs = config.session.timeout.as_secs(),
            "Application state initialized"
        );

        Self {
            config: Arc::new(config),
            clock,
            db_pool: backends.pool,
            tokens,
            sessions,
            rate_limiter,
            pipeline,
            realtime,
            auth_service,
            session_service,
        }
    }

    /// The expiration sweeper over this state's stores.
    pub fn sweeper(&self) -> Arc<ExpirationSweeper> {
        Arc::new(ExpirationSweeper::new(
            &self.config.session,
            Arc::clone(&self.sessions),
            Arc::clone(&self.tokens),
            Arc::clone(&self.realtime.dispatcher),
            Arc::clone(&self.rate_limiter),
        ))
    }

    /// The WebSocket heartbeat job.
    pub fn heartbeat_job(&self) -> HeartbeatJob {
        HeartbeatJob::new(
            Arc::clone(&self.realtime.dispatcher),
            Arc::clone(&self.clock),
            self.config.realtime.heartbeat_interval,
        )
    }
}
