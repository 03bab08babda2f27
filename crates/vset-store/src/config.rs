//! Store configuration

use tracing::warn;

use crate::error::{VectorError, VectorResult};

/// Environment variable holding the server URL
pub const ENV_URL: &str = "VSET_REDIS_URL";
/// Environment variable holding the vector-set key
pub const ENV_KEY: &str = "VSET_INDEX_KEY";
/// Environment variable holding the connect timeout in seconds
pub const ENV_CONNECT_TIMEOUT: &str = "VSET_CONNECT_TIMEOUT_SECS";

/// Configuration for a vector-set store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Server URL
    pub url: String,
    /// Key of the vector set
    pub key: String,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key: "vset:vectors".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the vector-set key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.connect_timeout_secs = timeout_secs;
        self
    }

    /// Load from `VSET_REDIS_URL`, `VSET_INDEX_KEY` and
    /// `VSET_CONNECT_TIMEOUT_SECS`, falling back to defaults for anything
    /// unset or blank
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let url = read(ENV_URL).unwrap_or(defaults.url);
        let key = read(ENV_KEY).unwrap_or(defaults.key);
        let connect_timeout_secs = match read(ENV_CONNECT_TIMEOUT) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(v) if v > 0 => v,
                _ => {
                    warn!(
                        env_var = ENV_CONNECT_TIMEOUT,
                        value = %raw,
                        "invalid connect timeout env value; using default"
                    );
                    defaults.connect_timeout_secs
                }
            },
            None => defaults.connect_timeout_secs,
        };

        Self {
            url,
            key,
            connect_timeout_secs,
        }
    }

    /// Check that the configuration can be used to open a store
    pub fn validate(&self) -> VectorResult<()> {
        if self.url.trim().is_empty() {
            return Err(VectorError::Config("server URL cannot be empty".to_string()));
        }
        if self.key.trim().is_empty() {
            return Err(VectorError::Config("vector-set key cannot be empty".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(VectorError::Config(
                "connect timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
