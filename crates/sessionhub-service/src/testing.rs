//! Shared wiring for the unit tests of this crate.

use std::sync::Arc;

use tokio::sync::mpsc;

use sessionhub_auth::{AuthContext, RateLimiter, RequestPipeline, SessionStore, TokenService};
use sessionhub_core::config::AppConfig;
use sessionhub_core::traits::{Clock, ManualClock};
use sessionhub_core::types::id::{SessionId, UserId};
use sessionhub_database::memory::{
    MemoryRefreshTokenRepository, MemorySessionRepository, MemoryUserRepository,
};
use sessionhub_realtime::{BroadcastDispatcher, ConnectionHandle, ConnectionRegistry, ServerEvent};

use crate::auth::{AuthService, LoginOutcome};
use crate::context::ClientInfo;
use crate::session::SessionService;

pub(crate) const PASSWORD: &str = "password123";

pub(crate) struct Harness {
    pub auth: AuthService,
    pub sessions: SessionService,
    pub store: Arc<SessionStore>,
    pub pipeline: Arc<RequestPipeline>,
    pub registry: Arc<ConnectionRegistry>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(max_per_user: u32) -> Self {
        let mut config = AppConfig::default();
        config.session.max_per_user = max_per_user;

        let clock = Arc::new(ManualClock::starting_now());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let users = Arc::new(MemoryUserRepository::new());

        let tokens = Arc::new(TokenService::new(
            &config.auth,
            Arc::new(MemoryRefreshTokenRepository::new()),
            users.clone(),
            dyn_clock.clone(),
        ));
        let store = Arc::new(SessionStore::new(
            &config.session,
            Arc::new(MemorySessionRepository::new()),
            dyn_clock.clone(),
        ));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit, dyn_clock.clone()));
        let pipeline = Arc::new(RequestPipeline::new(
            tokens.clone(),
            store.clone(),
            limiter,
        ));
        let registry = Arc::new(ConnectionRegistry::new(16));
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            registry.clone(),
            config.realtime.send_timeout,
        ));

        Self {
            auth: AuthService::new(
                &config.auth,
                users,
                tokens.clone(),
                store.clone(),
                dispatcher.clone(),
                dyn_clock.clone(),
            ),
            sessions: SessionService::new(store.clone(), tokens, dispatcher, dyn_clock),
            store,
            pipeline,
            registry,
            clock,
        }
    }

    pub async fn login(&self, email: &str) -> LoginOutcome {
        self.auth
            .login(email, PASSWORD, &ClientInfo::new("127.0.0.1", None))
            .await
            .expect("login should succeed")
    }

    pub fn connect(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        self.registry.register(user_id, session_id, self.clock.now())
    }

    pub async fn context(&self, login: &LoginOutcome) -> AuthContext {
        self.pipeline
            .authenticate(Some(&login.tokens.access_token))
            .await
            .expect("token should authenticate")
    }
}
