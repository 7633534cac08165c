//! Runtime configuration
//!
//! Defaults, overridden by environment variables, overridden by whatever the
//! binary parses from its command line.
//!
//! | Variable                    | Field             | Default                  |
//! |-----------------------------|-------------------|--------------------------|
//! | `BEE_API_URL`               | `bee_api_url`     | `http://localhost:8001`  |
//! | `BEELAB_STORE_URL`          | `store_url`       | `http://localhost:3000/api` |
//! | `BEELAB_DATA_DIR`           | `data_dir`        | `./data`                 |
//! | `BEELAB_REMOTE_TIMEOUT_MS`  | `remote_timeout_ms` | `30000`                |
//! | `BEELAB_BIND`               | `bind_addr`       | `127.0.0.1:3000`         |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration shared by the library wiring and the server binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Base URL of the optimization service
    pub bee_api_url: String,
    /// Base URL of the canonical experiment store
    pub store_url: String,
    /// Directory of the local cache (client) or canonical store (server)
    pub data_dir: PathBuf,
    /// Bound on every remote call, milliseconds
    pub remote_timeout_ms: u64,
    /// Listen address of the store server
    pub bind_addr: String,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            bee_api_url: "http://localhost:8001".to_string(),
            store_url: "http://localhost:3000/api".to_string(),
            data_dir: PathBuf::from("data"),
            remote_timeout_ms: 30_000,
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl LabConfig {
    /// Create a builder starting from defaults.
    #[must_use]
    pub fn builder() -> LabConfigBuilder {
        LabConfigBuilder::default()
    }

    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup` (the environment, or a map in tests).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup("BEE_API_URL") {
            config.bee_api_url = v;
        }
        if let Some(v) = lookup("BEELAB_STORE_URL") {
            config.store_url = v;
        }
        if let Some(v) = lookup("BEELAB_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("BEELAB_REMOTE_TIMEOUT_MS") {
            config.remote_timeout_ms = v.trim().parse().map_err(|e| {
                Error::Config(format!("BEELAB_REMOTE_TIMEOUT_MS={v:?} is not a number: {e}"))
            })?;
        }
        if let Some(v) = lookup("BEELAB_BIND") {
            config.bind_addr = v;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the stack unusable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero timeout or an empty URL.
    pub fn validate(&self) -> Result<()> {
        if self.remote_timeout_ms == 0 {
            return Err(Error::Config("remote timeout must be positive".to_string()));
        }
        if self.bee_api_url.trim().is_empty() || self.store_url.trim().is_empty() {
            return Err(Error::Config("service URLs must not be empty".to_string()));
        }
        Ok(())
    }

    /// Remote call bound as a `Duration`.
    #[must_use]
    pub const fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

/// Builder for `LabConfig`.
#[derive(Debug, Default)]
pub struct LabConfigBuilder {
    config: LabConfig,
}

impl LabConfigBuilder {
    /// Set the optimization service URL.
    #[must_use]
    pub fn bee_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.bee_api_url = url.into();
        self
    }

    /// Set the canonical store URL.
    #[must_use]
    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.config.store_url = url.into();
        self
    }

    /// Set the data directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the remote call bound.
    #[must_use]
    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.config.remote_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the server listen address.
    #[must_use]
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    /// Build and validate the `LabConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the result fails [`LabConfig::validate`].
    pub fn build(self) -> Result<LabConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
