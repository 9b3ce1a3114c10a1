use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub poll_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("POLL_INTERVAL_SECS must be a positive integer")]
    InvalidPollInterval,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(3001);
        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .ok()
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidPollInterval)
            })
            .transpose()?
            .unwrap_or(5);

        let config = Self {
            bind_addr,
            bind_port,
            poll_interval: Duration::from_secs(poll_interval_secs),
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Process environment is shared across test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn parse_defaults() {
        let _guard = env_guard();
        env::remove_var("BIND_ADDR");
        env::remove_var("BIND_PORT");
        env::remove_var("POLL_INTERVAL_SECS");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 3001);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn invalid_port_fails() {
        let _guard = env_guard();
        env::set_var("BIND_PORT", "not-a-port");

        let err = Config::from_env().expect_err("expected invalid port error");
        assert!(matches!(err, ConfigError::InvalidPort));

        env::remove_var("BIND_PORT");
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let _guard = env_guard();
        env::remove_var("BIND_PORT");
        env::set_var("POLL_INTERVAL_SECS", "0");

        let err = Config::from_env().expect_err("expected invalid interval error");
        assert!(matches!(err, ConfigError::InvalidPollInterval));

        env::remove_var("POLL_INTERVAL_SECS");
    }

    #[test]
    fn custom_poll_interval_parses() {
        let _guard = env_guard();
        env::remove_var("BIND_PORT");
        env::set_var("POLL_INTERVAL_SECS", "30");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.poll_interval, Duration::from_secs(30));

        env::remove_var("POLL_INTERVAL_SECS");
    }
}
