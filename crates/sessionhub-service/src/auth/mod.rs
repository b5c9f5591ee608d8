//! Signup, login, refresh and logout.

pub mod service;

pub use service::{AuthService, LoginOutcome};
