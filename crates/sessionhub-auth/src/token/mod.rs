//! Access/refresh token issuance and rotation.

pub mod opaque;
pub mod service;

pub use service::{IssuedTokens, TokenService};
