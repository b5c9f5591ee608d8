//! # sessionhub-entity
//!
//! Domain entity models for SessionHub. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.

pub mod session;
pub mod token;
pub mod user;
