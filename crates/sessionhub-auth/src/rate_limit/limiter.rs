//! Fixed-window rate limiter.
//!
//! Counters live in process memory, so limits only hold for a
//! single-process deployment. Running several replicas needs a shared
//! counter store in place of the map below.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use sessionhub_core::config::rate_limit::{RateLimitConfig, RateRule};
use sessionhub_core::error::AppError;
use sessionhub_core::result::AppResult;
use sessionhub_core::traits::Clock;
use sessionhub_core::types::id::UserId;

/// Budget a request is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// Login and signup. Every attempt counts.
    Auth,
    /// Ordinary reads. Only failures count.
    General,
    /// GraphQL traffic. Only failures count.
    GraphQl,
    /// Writes. Every attempt counts.
    Mutation,
    /// Listing and revoking sessions. Every attempt counts.
    SessionManagement,
}

impl OperationClass {
    /// Whether only failed operations are charged.
    pub fn counts_failures_only(&self) -> bool {
        matches!(self, Self::General | Self::GraphQl)
    }

    /// Short label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::General => "general",
            Self::GraphQl => "graphql",
            Self::Mutation => "mutation",
            Self::SessionManagement => "session_management",
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is being limited.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    /// A verified identity.
    User(UserId),
    /// An anonymous caller, by address.
    Ip(String),
}

impl RateLimitKey {
    /// `user:<id>` when an identity is known, otherwise `ip:<addr>`.
    pub fn derive(user_id: Option<UserId>, ip: &str) -> Self {
        match user_id {
            Some(id) => Self::User(id),
            None => Self::Ip(ip.to_string()),
        }
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Ip(addr) => write!(f, "ip:{addr}"),
        }
    }
}

/// Result of [`RateLimiter::allow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Proceed.
    Allowed,
    /// Fail fast; the window resets after `retry_after`.
    Denied {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

impl RateDecision {
    /// Whether the call may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: DateTime<Utc>,
    count: u32,
}

/// Fixed-window counters per `(key, class)`.
pub struct RateLimiter {
    windows: DashMap<(RateLimitKey, OperationClass), Window>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.config.enabled)
            .field("windows", &self.windows.len())
            .finish()
    }
}

impl RateLimiter {
    /// Creates a new rate limiter.
    pub fn new(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            config: config.clone(),
            clock,
        }
    }

    /// The rule governing `class`.
    pub fn rule(&self, class: OperationClass) -> RateRule {
        match class {
            OperationClass::Auth => self.config.auth,
            OperationClass::General => self.config.general,
            OperationClass::GraphQl => self.config.graphql,
            OperationClass::Mutation => self.config.mutation,
            OperationClass::SessionManagement => self.config.session_management,
        }
    }

    /// Admits or rejects one call.
    ///
    /// Count-every-attempt classes are charged here. Failures-only classes
    /// are only checked here and charged through [`RateLimiter::record_failure`].
    pub fn allow(&self, key: &RateLimitKey, class: OperationClass) -> RateDecision {
        if !self.config.enabled {
            return RateDecision::Allowed;
        }

        let rule = self.rule(class);
        let now = self.clock.now();
        let mut window = self
            .windows
            .entry((key.clone(), class))
            .or_insert(Window {
                started: now,
                count: 0,
            });
        reset_if_elapsed(&mut window, rule, now);

        if window.count >= rule.limit {
            let retry_after = retry_after(&window, rule, now);
            warn!(
                key = %key,
                class = %class,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            return RateDecision::Denied { retry_after };
        }

        if !class.counts_failures_only() {
            window.count += 1;
        }
        RateDecision::Allowed
    }

    /// [`RateLimiter::allow`] as a `Result`, failing with `RateLimited`.
    pub fn check(&self, key: &RateLimitKey, class: OperationClass) -> AppResult<()> {
        match self.allow(key, class) {
            RateDecision::Allowed => Ok(()),
            RateDecision::Denied { retry_after } => Err(AppError::rate_limited(retry_after)),
        }
    }

    /// Charges a failed operation to a failures-only budget.
    pub fn record_failure(&self, key: &RateLimitKey, class: OperationClass) {
        if !self.config.enabled || !class.counts_failures_only() {
            return;
        }
        let rule = self.rule(class);
        let now = self.clock.now();
        let mut window = self
            .windows
            .entry((key.clone(), class))
            .or_insert(Window {
                started: now,
                count: 0,
            });
        reset_if_elapsed(&mut window, rule, now);
        window.count = window.count.saturating_add(1);
    }

    /// Drops windows that have fully elapsed. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|(_, class), window| {
            let rule = self.rule(*class);
            !window_elapsed(window, rule, now)
        });
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, "Pruned idle rate-limit windows");
        }
        removed
    }

    /// Number of tracked windows.
    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }
}

fn window_elapsed(window: &Window, rule: RateRule, now: DateTime<Utc>) -> bool {
    (now - window.started)
        .to_std()
        .map(|elapsed| elapsed > rule.window)
        .unwrap_or(false)
}

fn reset_if_elapsed(window: &mut Window, rule: RateRule, now: DateTime<Utc>) {
    if window_elapsed(window, rule, now) {
        window.started = now;
        window.count = 0;
    }
}

fn retry_after(window: &Window, rule: RateRule, now: DateTime<Utc>) -> Duration {
    let elapsed = (now - window.started).to_std().unwrap_or(Duration::ZERO);
    rule.window
        .saturating_sub(elapsed)
        .max(Duration::from_secs(1))
}
