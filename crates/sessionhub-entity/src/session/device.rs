//! Client fingerprint parsed from the `User-Agent` header.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Laptop or desktop browser.
    Desktop,
    /// Phone.
    Mobile,
    /// Tablet.
    Tablet,
    /// Could not tell.
    #[default]
    Unknown,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Browser, OS and device category shown in the session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Browser family.
    pub browser: String,
    /// Operating system family.
    pub os: String,
    /// Device category.
    pub device_type: DeviceType,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            browser: "Unknown".to_string(),
            os: "Unknown".to_string(),
            device_type: DeviceType::Unknown,
        }
    }
}

impl DeviceInfo {
    /// Best-effort classification of a `User-Agent` string.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent.filter(|ua| !ua.trim().is_empty()) else {
            return Self::default();
        };

        // Order matters: Edge and Opera also advertise Chrome, Chrome advertises Safari.
        let browser = if ua.contains("Edg/") {
            "Edge"
        } else if ua.contains("OPR/") || ua.contains("Opera") {
            "Opera"
        } else if ua.contains("Firefox/") {
            "Firefox"
        } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
            "Chrome"
        } else if ua.contains("Safari/") {
            "Safari"
        } else {
            "Unknown"
        };

        let os = if ua.contains("Windows") {
            "Windows"
        } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iOS") {
            "iOS"
        } else if ua.contains("Android") {
            "Android"
        } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
            "macOS"
        } else if ua.contains("Linux") {
            "Linux"
        } else {
            "Unknown"
        };

        let device_type = if ua.contains("iPad") || ua.contains("Tablet") {
            DeviceType::Tablet
        } else if ua.contains("Mobile") || ua.contains("iPhone") || ua.contains("Android") {
            DeviceType::Mobile
        } else if os != "Unknown" {
            DeviceType::Desktop
        } else {
            DeviceType::Unknown
        };

        Self {
            browser: browser.to_string(),
            os: os.to_string(),
            device_type,
        }
    }
}
