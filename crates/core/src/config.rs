//! Configuration loading
//!
//! Settings are read with the `config` crate: an optional TOML/YAML file
//! followed by environment overrides under a prefix, e.g.
//! `COURIER_LOG_LEVEL=debug`. Nested keys use `__` as separator.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment prefix used by [`InstrumentationConfig::from_env`]
pub const ENV_PREFIX: &str = "COURIER";

/// Load `T` from an optional file plus prefixed environment variables.
///
/// Fields missing from both sources fall back to `T`'s serde defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the merged settings do not
/// deserialize into `T`.
pub fn load<T: DeserializeOwned>(path: Option<&Path>, env_prefix: Option<&str>) -> Result<T> {
    load_from(path, env_prefix, None)
}

/// Like [`load`], with overrides read from `vars` instead of the process
/// environment
///
/// # Errors
///
/// Returns an error if the file cannot be read or the merged settings do not
/// deserialize into `T`.
pub fn load_with_vars<T, I>(path: Option<&Path>, env_prefix: &str, vars: I) -> Result<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    load_from(path, Some(env_prefix), Some(vars.into_iter().collect()))
}

fn load_from<T: DeserializeOwned>(
    path: Option<&Path>,
    env_prefix: Option<&str>,
    vars: Option<::config::Map<String, String>>,
) -> Result<T> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(::config::File::from(path));
    }
    if let Some(prefix) = env_prefix {
        builder = builder.add_source(
            ::config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(vars),
        );
    }
    Ok(builder.build()?.try_deserialize()?)
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging and span reporting settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    /// Service name attached to initialization logs
    pub service_name: String,
    /// Log level filter used when `RUST_LOG` is unset (e.g. "info", "courier=debug")
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "courier".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl InstrumentationConfig {
    /// Load from a file, with `COURIER_*` environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load(Some(path.as_ref()), Some(ENV_PREFIX))
    }

    /// Load from `COURIER_*` environment variables only
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self> {
        load(None, Some(ENV_PREFIX))
    }

    /// Development settings: debug level, text output
    pub fn dev() -> Self {
        Self {
            service_name: "courier-dev".to_string(),
            log_level: "debug".to_string(),
            ..Self::default()
        }
    }
}
