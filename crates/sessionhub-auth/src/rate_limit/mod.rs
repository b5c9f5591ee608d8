//! Fixed-window rate limiting keyed by identity or address.

pub mod limiter;

pub use limiter::{OperationClass, RateDecision, RateLimitKey, RateLimiter};
