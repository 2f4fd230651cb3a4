//! Environment configuration for the pong service
//!
//! Variables use the `PONG_` prefix followed by the uppercased field name:
//! - `PONG_HOSTADDR`: address handed to the ping job (required)
//! - `PONG_PORT`: port the ping endpoint binds (default: 80)
//! - `PONG_DRAINTIMEOUTSECS`: bound on the graceful drain (default: unbounded)

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PONG";
pub const DEFAULT_PORT: u16 = 80;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required variable {0} is not set")]
    Missing(String),

    #[error("invalid value '{value}' for {key}: expected {expected}")]
    Invalid {
        key: String,
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Pong service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host_addr: String,
    pub port: u16,
    pub drain_timeout: Option<Duration>,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve full variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| -> (String, Option<String>) {
            let key = format!("{}_{}", ENV_PREFIX, field.to_uppercase());
            let value = lookup(&key).filter(|v| !v.is_empty());
            (key, value)
        };

        let host_addr = match get("HostAddr") {
            (_, Some(value)) => value,
            (key, None) => return Err(ConfigError::Missing(key)),
        };

        let port = match get("Port") {
            (key, Some(value)) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key,
                field: "Port",
                value,
                expected: "an unsigned 16-bit port",
            })?,
            (_, None) => DEFAULT_PORT,
        };

        let drain_timeout = match get("DrainTimeoutSecs") {
            (key, Some(value)) => Some(Duration::from_secs(value.trim().parse::<u64>().map_err(
                |_| ConfigError::Invalid {
                    key,
                    field: "DrainTimeoutSecs",
                    value,
                    expected: "a whole number of seconds",
                },
            )?)),
            (_, None) => None,
        };

        Ok(AppConfig {
            host_addr,
            port,
            drain_timeout,
        })
    }

    /// Address the ping endpoint listens on (all interfaces)
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
