//! Wire messages exchanged over the push channel.

pub mod types;

pub use types::{ClientMessage, ForceLogoutReason, ServerEvent};
