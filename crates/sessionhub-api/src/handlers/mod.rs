//! Route handlers organized by domain.

pub mod account;
pub mod auth;
pub mod health;
pub mod sessions;
pub mod ws;
