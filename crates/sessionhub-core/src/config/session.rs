//! Session lifecycle configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding inactivity window. Each touch pushes `expires_at` to `now + timeout`.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Absolute ceiling measured from session creation.
    #[serde(default = "default_lifetime", with = "humantime_serde")]
    pub lifetime: Duration,
    /// Maximum live sessions per user. The oldest is evicted past this.
    #[serde(default = "default_max_per_user")]
    pub max_per_user: u32,
    /// Period of the expiration sweep.
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Rows deleted per sweep batch. Shutdown is checked between batches.
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            lifetime: default_lifetime(),
            max_per_user: default_max_per_user(),
            sweep_interval: default_sweep_interval(),
            sweep_batch_size: default_sweep_batch_size(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_lifetime() -> Duration {
    Duration::from_secs(168 * 60 * 60)
}

fn default_max_per_user() -> u32 {
    5
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_sweep_batch_size() -> usize {
    500
}
