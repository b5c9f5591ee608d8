//! Session entity and device fingerprinting.

pub mod device;
pub mod model;

pub use device::{DeviceInfo, DeviceType};
pub use model::Session;
