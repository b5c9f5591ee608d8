//! Custom Axum extractors.

pub mod auth;
pub mod client;
pub mod json;
pub mod path;

pub use auth::AuthUser;
pub use client::{ClientMeta, client_ip};
pub use json::ValidatedJson;
pub use path::parse_session_id;
