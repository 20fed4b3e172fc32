//! Server configuration loaded from environment variables.

use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PING_SECS: u64 = 10;
const DEFAULT_MAX_ROOMS: usize = 16;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the websocket listener binds to
    pub addr: SocketAddr,
    /// Interval between keepalive pings
    pub ping_interval: Duration,
    /// Maximum number of rooms open at once
    pub max_rooms: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ping_interval: Duration::from_secs(DEFAULT_PING_SECS),
            max_rooms: DEFAULT_MAX_ROOMS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `ERIANTYS_ADDR`, `ERIANTYS_PING_SECS` and
    /// `ERIANTYS_MAX_ROOMS`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_str = lookup("ERIANTYS_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_str
            .parse::<SocketAddr>()
            .with_context(|| format!("ERIANTYS_ADDR must be host:port, got '{addr_str}'"))?;

        let ping_secs = match lookup("ERIANTYS_PING_SECS") {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("ERIANTYS_PING_SECS must be a number, got '{value}'"))?,
            None => DEFAULT_PING_SECS,
        };
        if ping_secs == 0 {
            anyhow::bail!("ERIANTYS_PING_SECS must be greater than zero");
        }

        let max_rooms = match lookup("ERIANTYS_MAX_ROOMS") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("ERIANTYS_MAX_ROOMS must be a number, got '{value}'"))?,
            None => DEFAULT_MAX_ROOMS,
        };

        Ok(Self {
            addr,
            ping_interval: Duration::from_secs(ping_secs),
            max_rooms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        let default = ServerConfig::default();
        assert_eq!(config.addr, default.addr);
        assert_eq!(config.ping_interval, Duration::from_secs(10));
        assert_eq!(config.max_rooms, 16);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ERIANTYS_ADDR", "127.0.0.1:9000"),
            ("ERIANTYS_PING_SECS", "3"),
            ("ERIANTYS_MAX_ROOMS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.ping_interval, Duration::from_secs(3));
        assert_eq!(config.max_rooms, 2);
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_lookup(lookup(&[("ERIANTYS_ADDR", "nowhere")])).unwrap_err();
        assert!(err.to_string().contains("ERIANTYS_ADDR"));

        assert!(ServerConfig::from_lookup(lookup(&[("ERIANTYS_PING_SECS", "0")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("ERIANTYS_MAX_ROOMS", "many")])).is_err());
    }
}
