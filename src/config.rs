//! Core configuration
//!
//! Defaults, an optional TOML file, and environment-variable overrides
//! (`PARAMS_PATH`, `PARAMS_POLL_MS`, `AUDIT_ENABLED`, `AUDIT_PATH`,
//! `HISTORY_CAPACITY`, `RECENT_TRADES_CAPACITY`), applied in that order.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Runtime configuration for the core
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Parameter document path
    pub params_path: PathBuf,
    /// Parameter poll interval in milliseconds
    pub params_poll_ms: u64,
    /// Whether the decision audit log is written
    pub audit_enabled: bool,
    /// Audit log path (JSONL)
    pub audit_path: PathBuf,
    /// Price history ring capacity per market
    pub history_capacity: usize,
    /// Recent-trade ring capacity per market
    pub recent_trades_capacity: usize,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            params_path: PathBuf::from("watch_bot_analyzer/output/params_latest.json"),
            params_poll_ms: 3_000,
            audit_enabled: false,
            audit_path: PathBuf::from("logs/parity_debug.jsonl"),
            history_capacity: 1_000,
            recent_trades_capacity: 100,
            log_level: "info".to_string(),
        }
    }
}

impl CoreConfig {
    /// Load configuration: defaults, then the optional TOML file, then
    /// environment variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay recognized environment variables
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("PARAMS_PATH") {
            self.params_path = PathBuf::from(value);
        }
        read_env("PARAMS_POLL_MS", &mut self.params_poll_ms);
        if let Ok(value) = std::env::var("AUDIT_ENABLED") {
            self.audit_enabled = parse_flag(&value);
        }
        if let Ok(value) = std::env::var("AUDIT_PATH") {
            self.audit_path = PathBuf::from(value);
        }
        read_env("HISTORY_CAPACITY", &mut self.history_capacity);
        read_env("RECENT_TRADES_CAPACITY", &mut self.recent_trades_capacity);
        if let Ok(value) = std::env::var("LOG_LEVEL") {
            self.log_level = value;
        }
    }
}

fn read_env<T: FromStr>(name: &str, target: &mut T) {
    let Ok(value) = std::env::var(name) else {
        return;
    };
    match value.parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => tracing::warn!(var = name, value = %value, "ignoring unparseable env override"),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
