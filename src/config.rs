//! Configuration Module
//!
//! Loads node server configuration from environment variables.

use std::env;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

/// Node server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the shared hash and of its notification channel
    pub map_name: String,
    /// Maximum number of keys admitted into the local cache
    pub local_key_limit: usize,
    /// Redis host
    pub redis_host: String,
    /// Redis port
    pub redis_port: u16,
    /// Optional Redis password
    pub redis_password: Option<String>,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAP_NAME` - Shared map name (default: shared)
    /// - `LOCAL_KEY_LIMIT` - Local cache admission limit (default: 1000)
    /// - `REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `REDIS_PORT` - Redis port (default: 6379)
    /// - `REDIS_PASSWORD` - Redis password (default: none)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            map_name: env::var("MAP_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.map_name),
            local_key_limit: env::var("LOCAL_KEY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.local_key_limit),
            redis_host: env::var("REDIS_HOST")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.redis_host),
            redis_port: env::var("REDIS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.redis_port),
            redis_password: env::var("REDIS_PASSWORD").ok().filter(|v| !v.is_empty()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Builds the Redis connection settings, including the password when one
    /// is set.
    ///
    /// The password is passed as is, never through a URL, so it may contain
    /// any character.
    pub fn redis_connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.redis_host.clone(), self.redis_port),
            redis: RedisConnectionInfo {
                password: self.redis_password.clone(),
                ..RedisConnectionInfo::default()
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_name: "shared".to_string(),
            local_key_limit: 1000,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_password: None,
            server_port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.map_name, "shared");
        assert_eq!(config.local_key_limit, 1000);
        assert_eq!(config.redis_host, "127.0.0.1");
        assert_eq!(config.redis_port, 6379);
        assert!(config.redis_password.is_none());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("MAP_NAME");
        env::remove_var("LOCAL_KEY_LIMIT");
        env::remove_var("REDIS_HOST");
        env::remove_var("REDIS_PORT");
        env::remove_var("REDIS_PASSWORD");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert_eq!(config.map_name, "shared");
        assert_eq!(config.local_key_limit, 1000);
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_redis_connection_info() {
        let mut config = Config::default();
        let info = config.redis_connection_info();
        assert!(matches!(
            &info.addr,
            ConnectionAddr::Tcp(host, 6379) if host == "127.0.0.1"
        ));
        assert!(info.redis.password.is_none());
        assert_eq!(info.redis.db, 0);

        config.redis_password = Some("p@ss/w:rd#1".to_string());
        let info = config.redis_connection_info();
        assert_eq!(info.redis.password.as_deref(), Some("p@ss/w:rd#1"));
        assert!(matches!(
            &info.addr,
            ConnectionAddr::Tcp(host, 6379) if host == "127.0.0.1"
        ));
    }
}
