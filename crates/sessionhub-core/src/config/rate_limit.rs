//! Rate limiting configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One fixed-window rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRule {
    /// Window length.
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Calls (or failures) allowed per window.
    pub limit: u32,
}

impl RateRule {
    const fn per_quarter_hour(limit: u32) -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            limit,
        }
    }
}

/// Per operation class rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Master switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Login and signup attempts, keyed by IP.
    #[serde(default = "default_auth")]
    pub auth: RateRule,
    /// General API traffic. Only failures count.
    #[serde(default = "default_general")]
    pub general: RateRule,
    /// GraphQL traffic. Only failures count.
    #[serde(default = "default_graphql")]
    pub graphql: RateRule,
    /// Mutating calls.
    #[serde(default = "default_mutation")]
    pub mutation: RateRule,
    /// Session listing and revocation.
    #[serde(default = "default_session_management")]
    pub session_management: RateRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: default_auth(),
            general: default_general(),
            graphql: default_graphql(),
            mutation: default_mutation(),
            session_management: default_session_management(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_auth() -> RateRule {
    RateRule::per_quarter_hour(5)
}

fn default_general() -> RateRule {
    RateRule::per_quarter_hour(500)
}

fn default_graphql() -> RateRule {
    RateRule::per_quarter_hour(100)
}

fn default_mutation() -> RateRule {
    RateRule::per_quarter_hour(30)
}

fn default_session_management() -> RateRule {
    RateRule::per_quarter_hour(50)
}
