//! Connection tuning

use std::path::Path;
use std::time::Duration;

use courier_core::Result;
use serde::{Deserialize, Serialize};

/// Environment prefix for overrides, e.g. `COURIER_AMQP_VHOST=/orders`
pub const ENV_PREFIX: &str = "COURIER_AMQP";

/// Options used when dialing the broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmqpConfig {
    pub vhost: String,
    /// Zero disables heartbeats
    pub heartbeat_secs: u64,
    /// Zero lets the server decide
    pub channel_max: u16,
    /// Zero lets the server decide
    pub frame_size: u32,
    pub locale: String,
}

impl Default for AmqpConfig {
    fn default() -> Self {
        Self {
            vhost: "/".to_string(),
            heartbeat_secs: 10,
            channel_max: 0,
            frame_size: 0,
            locale: "en_US".to_string(),
        }
    }
}

impl AmqpConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        courier_core::config::load(Some(path.as_ref()), Some(ENV_PREFIX))
    }

    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self> {
        courier_core::config::load(None, Some(ENV_PREFIX))
    }

    pub const fn heartbeat(&self) -> Option<Duration> {
        match self.heartbeat_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
