//! Application settings loaded via OrthoConfig.
//!
//! Every value can come from a `CARDS_*` environment variable, a CLI flag or
//! a configuration file. Unset values fall back to the defaults exposed by the
//! accessors.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CACHE_NAMESPACE: &str = "cards";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_REDIS_MAX_CONNECTIONS: u32 = 8;
const FLAG_EXPECTED: &str = "true|false|1|0|yes|no|on|off";
const DEFAULT_SYSTEM_TAG: &str = "card-tracker";

/// Raised when a configured value cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The bind address is not `host:port`.
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        /// Configured value.
        value: String,
        /// Parser failure.
        #[source]
        source: std::net::AddrParseError,
    },
    /// A boolean toggle holds something other than a recognised spelling.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    Flag {
        /// Setting name.
        name: &'static str,
        /// Configured value.
        value: String,
        /// Accepted spellings.
        expected: &'static str,
    },
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::Flag {
            name,
            value: value.to_owned(),
            expected: FLAG_EXPECTED,
        }),
    }
}

/// Runtime configuration for the card tracker service.
///
/// Boolean toggles are held as text and parsed by their accessors, so a flag
/// left off the command line stays unset and environment or file values
/// still apply.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CARDS")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. Without it items live in memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Redis connection string. Without it the cache is in memory and queue
    /// messages are dropped.
    pub redis_url: Option<String>,
    /// Upper bound on pooled Redis connections.
    pub redis_max_connections: Option<u32>,
    /// Prefix for every Redis cache key.
    pub cache_namespace: Option<String>,
    /// Default cache lifetime in seconds; `0` disables expiry.
    pub cache_ttl_secs: Option<u64>,
    /// File holding the session signing key.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`; required in release builds.
    pub cookie_secure: Option<String>,
    /// `SameSite` policy: `Strict`, `Lax` or `None`.
    pub same_site: Option<String>,
    /// Accept a generated session key when the key file is unreadable.
    pub allow_ephemeral_session_key: Option<String>,
    /// JSON file listing API tokens accepted by `POST /api/v1/session`.
    pub api_token_file: Option<PathBuf>,
    /// Source tag stamped on outgoing exchange payloads.
    pub system_tag: Option<String>,
}

impl AppSettings {
    /// Address to bind, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// [`SettingsError::BindAddr`] when the configured value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Database pool size.
    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Redis pool size.
    #[must_use]
    pub fn redis_max_connections(&self) -> u32 {
        self.redis_max_connections
            .unwrap_or(DEFAULT_REDIS_MAX_CONNECTIONS)
    }

    /// Explicit `Secure` cookie choice; `None` when unset.
    ///
    /// # Errors
    /// [`SettingsError::Flag`] when the value is not a boolean spelling.
    pub fn cookie_secure(&self) -> Result<Option<bool>, SettingsError> {
        self.cookie_secure
            .as_deref()
            .map(|value| parse_flag("cookie_secure", value))
            .transpose()
    }

    /// Whether a generated session key may stand in for the key file.
    ///
    /// # Errors
    /// [`SettingsError::Flag`] when the value is not a boolean spelling.
    pub fn allow_ephemeral_session_key(&self) -> Result<bool, SettingsError> {
        self.allow_ephemeral_session_key
            .as_deref()
            .map_or(Ok(false), |value| {
                parse_flag("allow_ephemeral_session_key", value)
            })
    }

    /// Redis cache key prefix.
    #[must_use]
    pub fn cache_namespace(&self) -> &str {
        self.cache_namespace
            .as_deref()
            .unwrap_or(DEFAULT_CACHE_NAMESPACE)
    }

    /// Default cache lifetime; `None` when expiry is disabled.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Session key file path.
    #[must_use]
    pub fn session_key_file(&self) -> &Path {
        self.session_key_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SESSION_KEY_FILE))
    }

    /// Source tag for exchange payloads.
    #[must_use]
    pub fn system_tag(&self) -> &str {
        self.system_tag.as_deref().unwrap_or(DEFAULT_SYSTEM_TAG)
    }
}
