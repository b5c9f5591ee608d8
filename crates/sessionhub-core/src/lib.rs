//! # sessionhub-core
//!
//! Core crate for SessionHub. Contains configuration schemas, typed
//! identifiers, the injectable clock, and the unified error system.
//!
//! This crate has **no** internal dependencies on other SessionHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorDetails, ErrorKind};
pub use result::AppResult;
