//! Request metadata that is not part of the authenticated identity.

use serde::{Deserialize, Serialize};

use sessionhub_entity::session::DeviceInfo;

/// Where a request came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client address, best effort.
    pub ip_address: String,
    /// Raw `User-Agent` header.
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Creates request metadata.
    pub fn new(ip_address: impl Into<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent,
        }
    }

    /// Device fingerprint parsed from the user agent.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::from_user_agent(self.user_agent.as_deref())
    }
}
