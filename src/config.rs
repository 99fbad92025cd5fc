//! Provider settings from the environment. Load `.env` with `dotenvy` before calling `from_env`.

use crate::error::ConfigError;
use std::net::SocketAddr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://hosted_apps.db";
pub const DEFAULT_AUTHORITY: &str = "com.jamdeo.tv.provider.hostedapps";
pub const DEFAULT_BASE_PATH: &str = "hosted_apps";
pub const DEFAULT_NOTIFY_CAPACITY: usize = 64;
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub database_url: String,
    /// Authority part of every resource address (`content://<authority>/...`).
    pub authority: String,
    /// Single path segment naming the collection.
    pub base_path: String,
    /// Change events buffered per subscriber before lagging ones start dropping.
    pub notify_capacity: usize,
    pub bind: SocketAddr,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            database_url: DEFAULT_DATABASE_URL.into(),
            authority: DEFAULT_AUTHORITY.into(),
            base_path: DEFAULT_BASE_PATH.into(),
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl ProviderConfig {
    /// Reads `DATABASE_URL`, `HOSTED_APPS_AUTHORITY`, `HOSTED_APPS_BASE_PATH`,
    /// `HOSTED_APPS_NOTIFY_CAPACITY` and `HOSTED_APPS_BIND`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let authority = lookup("HOSTED_APPS_AUTHORITY").unwrap_or_else(|| DEFAULT_AUTHORITY.into());
        let base_path = lookup("HOSTED_APPS_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.into());
        let notify_capacity = match lookup("HOSTED_APPS_NOTIFY_CAPACITY") {
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                key: "HOSTED_APPS_NOTIFY_CAPACITY",
                reason: e.to_string(),
            })?,
            None => DEFAULT_NOTIFY_CAPACITY,
        };
        let bind = lookup("HOSTED_APPS_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.into())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "HOSTED_APPS_BIND",
                reason: e.to_string(),
            })?;

        let config = ProviderConfig {
            database_url,
            authority,
            base_path,
            notify_capacity,
            bind,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.authority.is_empty() {
            return Err(ConfigError::Missing("HOSTED_APPS_AUTHORITY"));
        }
        if self.authority.contains('/') {
            return Err(ConfigError::Invalid {
                key: "HOSTED_APPS_AUTHORITY",
                reason: "must not contain '/'".into(),
            });
        }
        if self.base_path.is_empty() {
            return Err(ConfigError::Missing("HOSTED_APPS_BASE_PATH"));
        }
        if self.base_path.contains('/') {
            return Err(ConfigError::Invalid {
                key: "HOSTED_APPS_BASE_PATH",
                reason: "must be a single path segment".into(),
            });
        }
        if self.notify_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "HOSTED_APPS_NOTIFY_CAPACITY",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}
