//! Typed path parameter helpers.

use uuid::Uuid;

use sessionhub_core::error::AppError;
use sessionhub_core::types::id::SessionId;

/// Parses a session id from a path segment.
pub fn parse_session_id(s: &str) -> Result<SessionId, AppError> {
    Uuid::parse_str(s)
        .map(SessionId::from_uuid)
        .map_err(|_| AppError::validation(format!("Invalid session id: {s}")))
}
