//! Role-based access gate.

pub mod gate;

pub use gate::{RoleRequirement, allowed};
