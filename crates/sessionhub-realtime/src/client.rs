//! Receiver-side rule for `force-logout` events.
//!
//! The server broadcasts logout events to every connection of a user,
//! including the device that triggered them. Each client decides with
//! [`should_honor`] whether the event applies to its own session.

use sessionhub_core::types::id::SessionId;

use crate::message::ServerEvent;

/// Whether a client holding `own_session` must sign out on `event`.
///
/// Only `force-logout` events ever require action. They are ignored when
/// they exclude `own_session`, or when they name target sessions that do
/// not include it.
pub fn should_honor(event: &ServerEvent, own_session: SessionId) -> bool {
    let ServerEvent::ForceLogout {
        session_id,
        exclude_session_token,
        session_ids,
        ..
    } = event
    else {
        return false;
    };

    if *exclude_session_token == Some(own_session) {
        return false;
    }
    if let Some(target) = session_id {
        if *target != own_session {
            return false;
        }
    }
    if !session_ids.is_empty() && !session_ids.contains(&own_session) {
        return false;
    }
    true
}
