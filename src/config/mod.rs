//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::util::time::{DEFAULT_SYNC_INTERVAL_MS, DEFAULT_SYNC_MIN_GAP_MS, DEFAULT_TICK_RATE};

/// How this process takes part in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Both players on one device, no peer link
    SingleDevice,
    /// Accept the peer connection and own the ball and score
    Host,
    /// Dial the host and mirror its ball and score
    Guest,
}

impl FromStr for LaunchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "single_device" | "local" => Ok(Self::SingleDevice),
            "host" => Ok(Self::Host),
            "guest" | "join" => Ok(Self::Guest),
            _ => Err(ConfigError::Invalid("ARENA_MODE")),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Session role selection
    pub mode: LaunchMode,
    /// Host binding address
    pub listen_addr: SocketAddr,
    /// Host WebSocket URL the guest dials
    pub peer_url: Option<String>,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Sync timer period
    pub sync_interval: Duration,
    /// Minimum spacing between two emissions
    pub sync_min_gap: Duration,
    /// Score that ends the game (0 = play forever)
    pub win_score: u32,
    /// Scripted input file, stdin when absent
    pub input_script: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("ARENA_MODE") {
            Some(raw) => raw.parse()?,
            None => LaunchMode::SingleDevice,
        };

        let listen_addr = if let Some(port) = lookup("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:55555".to_string())
        };

        let peer_url = lookup("PEER_URL");
        if mode == LaunchMode::Guest && peer_url.is_none() {
            return Err(ConfigError::Missing("PEER_URL"));
        }

        let tick_rate: u32 = parse_or(&lookup, "TICK_RATE", DEFAULT_TICK_RATE)?;
        if tick_rate == 0 {
            return Err(ConfigError::Invalid("TICK_RATE"));
        }

        let sync_interval_ms: u64 = parse_or(&lookup, "SYNC_INTERVAL_MS", DEFAULT_SYNC_INTERVAL_MS)?;
        if sync_interval_ms == 0 {
            return Err(ConfigError::Invalid("SYNC_INTERVAL_MS"));
        }
        let sync_min_gap_ms: u64 = parse_or(&lookup, "SYNC_MIN_GAP_MS", DEFAULT_SYNC_MIN_GAP_MS)?;

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            mode,
            listen_addr: listen_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            peer_url,
            tick_rate,
            sync_interval: Duration::from_millis(sync_interval_ms),
            sync_min_gap: Duration::from_millis(sync_min_gap_ms),
            win_score: parse_or(&lookup, "WIN_SCORE", 5)?,
            input_script: lookup("INPUT_SCRIPT"),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid listen address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_single_device() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.mode, LaunchMode::SingleDevice);
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.sync_interval, Duration::from_millis(100));
        assert_eq!(config.sync_min_gap, Duration::from_millis(80));
        assert_eq!(config.win_score, 5);
        assert_eq!(config.listen_addr.port(), 55555);
    }

    #[test]
    fn guest_requires_peer_url() {
        let err = config_from(&[("ARENA_MODE", "guest")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PEER_URL")));

        let config = config_from(&[
            ("ARENA_MODE", "guest"),
            ("PEER_URL", "ws://127.0.0.1:55555/peer"),
        ])
        .unwrap();
        assert_eq!(config.mode, LaunchMode::Guest);
    }

    #[test]
    fn port_overrides_listen_addr() {
        let config = config_from(&[("PORT", "9000"), ("LISTEN_ADDR", "127.0.0.1:1")]).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            config_from(&[("SYNC_INTERVAL_MS", "soon")]).unwrap_err(),
            ConfigError::Invalid("SYNC_INTERVAL_MS")
        ));
        assert!(matches!(
            config_from(&[("TICK_RATE", "0")]).unwrap_err(),
            ConfigError::Invalid("TICK_RATE")
        ));
        assert!(matches!(
            config_from(&[("ARENA_MODE", "spectator")]).unwrap_err(),
            ConfigError::Invalid("ARENA_MODE")
        ));
    }
}
