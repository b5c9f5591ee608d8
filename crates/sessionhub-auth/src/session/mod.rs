//! Session records with sliding expiration.

pub mod store;

pub use store::{CreatedSession, SessionStore};
