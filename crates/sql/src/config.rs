//! Connection pool settings

use std::path::Path;
use std::time::Duration;

use courier_core::Result;
use serde::{Deserialize, Serialize};

/// Environment prefix for pool overrides, e.g. `COURIER_SQL_MAX_OPEN_CONNS=20`
pub const ENV_PREFIX: &str = "COURIER_SQL";

/// Pool knobs forwarded to the driver.
///
/// Absent fields leave the driver's own defaults in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Zero means unlimited
    pub max_open_conns: Option<u32>,
    pub max_idle_conns: Option<u32>,
    /// Zero means connections are never closed for age
    pub conn_max_lifetime_secs: Option<u64>,
}

impl PoolConfig {
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

    /// Lifetime to hand to the driver, `Some(None)` meaning unlimited
    pub fn conn_max_lifetime(&self) -> Option<Option<Duration>> {
        self.conn_max_lifetime_secs.map(|secs| match secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_leaves_everything_unset() {
        let config = PoolConfig::default();
        assert_eq!(config.max_open_conns, None);
        assert_eq!(config.conn_max_lifetime(), None);
    }

    #[test]
    fn test_lifetime_zero_is_unlimited() {
        let config = PoolConfig {
            conn_max_lifetime_secs: Some(0),
            ..PoolConfig::default()
        };
        assert_eq!(config.conn_max_lifetime(), Some(None));

        let config = PoolConfig {
            conn_max_lifetime_secs: Some(30),
            ..PoolConfig::default()
        };
        assert_eq!(config.conn_max_lifetime(), Some(Some(Duration::from_secs(30))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_open_conns = 20\nconn_max_lifetime_secs = 300").unwrap();

        let config = PoolConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_open_conns, Some(20));
        assert_eq!(config.max_idle_conns, None);
        assert_eq!(config.conn_max_lifetime_secs, Some(300));
    }

    #[test]
    fn test_env_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_open_conns = 5\nmax_idle_conns = 2").unwrap();

        let config: PoolConfig = courier_core::config::load_with_vars(
            Some(file.path()),
            ENV_PREFIX,
            [
                ("COURIER_SQL_MAX_OPEN_CONNS".to_string(), "20".to_string()),
                ("COURIER_SQL_CONN_MAX_LIFETIME_SECS".to_string(), "0".to_string()),
            ],
        )
        .unwrap();

        assert_eq!(config.max_open_conns, Some(20));
        assert_eq!(config.max_idle_conns, Some(2));
        assert_eq!(config.conn_max_lifetime(), Some(None));
    }
}
