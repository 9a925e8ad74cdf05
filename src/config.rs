//! Host server settings read from the environment.

use crate::state::DEFAULT_LUCK_BREAK_DELAY;
use std::net::SocketAddr;
use std::time::Duration;

/// 6573 is ascii for "AI"
pub const DEFAULT_BIND: &str = "0.0.0.0:6573";
pub const DEFAULT_INITIAL_LIVES: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Lives each guest starts with
    pub initial_lives: u32,
    /// Pause before a broken luck block shows its effect
    pub luck_break_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 6573)),
            initial_lives: DEFAULT_INITIAL_LIVES,
            luck_break_delay: DEFAULT_LUCK_BREAK_DELAY,
        }
    }
}

impl ServerConfig {
    /// Load from GOLDCLASH_BIND, INITIAL_LIVES and LUCK_BREAK_DELAY_MS.
    /// Unparseable values fall back to the defaults with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = match std::env::var("GOLDCLASH_BIND") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid GOLDCLASH_BIND {:?}, using {}", raw, DEFAULT_BIND);
                defaults.bind
            }),
            Err(_) => defaults.bind,
        };

        let initial_lives = std::env::var("INITIAL_LIVES")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(|lives| lives.max(1))
            .unwrap_or(defaults.initial_lives);

        let luck_break_delay = std::env::var("LUCK_BREAK_DELAY_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.luck_break_delay);

        Self {
            bind,
            initial_lives,
            luck_break_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in ["GOLDCLASH_BIND", "INITIAL_LIVES", "LUCK_BREAK_DELAY_MS"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = ServerConfig::from_env();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("GOLDCLASH_BIND", "127.0.0.1:9000");
        std::env::set_var("INITIAL_LIVES", "8");
        std::env::set_var("LUCK_BREAK_DELAY_MS", "250");

        let config = ServerConfig::from_env();
        assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(config.initial_lives, 8);
        assert_eq!(config.luck_break_delay, Duration::from_millis(250));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_bad_values_fall_back() {
        clear_env();
        std::env::set_var("GOLDCLASH_BIND", "not an address");
        std::env::set_var("INITIAL_LIVES", "0");
        std::env::set_var("LUCK_BREAK_DELAY_MS", "soon");

        let config = ServerConfig::from_env();
        assert_eq!(config.bind, ServerConfig::default().bind);
        assert_eq!(config.initial_lives, 1);
        assert_eq!(config.luck_break_delay, DEFAULT_LUCK_BREAK_DELAY);
        clear_env();
    }
}
