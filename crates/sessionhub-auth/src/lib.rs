//! # sessionhub-auth
//!
//! The token and session lifecycle engine.
//!
//! ## Modules
//!
//! - `jwt`: signed access-token claims, encoding and verification
//! - `password`: Argon2id password hashing
//! - `token`: issuance, verification and rotation of access/refresh pairs
//! - `session`: session store with sliding expiration and per-user cap
//! - `rate_limit`: fixed-window limiter keyed by identity or address
//! - `rbac`: role gate
//! - `pipeline`: per-request composition of the above

pub mod jwt;
pub mod password;
pub mod pipeline;
pub mod rate_limit;
pub mod rbac;
pub mod session;
pub mod token;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use pipeline::{AuthContext, RequestPipeline, bearer_token};
pub use rate_limit::{OperationClass, RateDecision, RateLimitKey, RateLimiter};
pub use rbac::{RoleRequirement, allowed};
pub use session::{CreatedSession, SessionStore};
pub use token::{IssuedTokens, TokenService};
