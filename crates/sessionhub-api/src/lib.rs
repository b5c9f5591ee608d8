//! # sessionhub-api
//!
//! HTTP API layer for SessionHub built on Axum.
//!
//! ## Modules
//!
//! - `state`: shared application state wiring every component together
//! - `router`: route table and per-group rate-limit layers
//! - `handlers`: auth, account, session management, health and WebSocket
//! - `middleware`: rate limiting and CORS
//! - `extractors`: `AuthUser` and client address extraction
//! - `dto`: request/response bodies
//! - `error`: `AppError` to HTTP response mapping

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;
