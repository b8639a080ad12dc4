//! Runtime configuration, read from the environment (and `.env` via
//! `dotenvy` in the binary).

use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Live bus-location polling interval.
    pub poll_interval: Duration,
    pub session_file: String,
    pub log_file_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            session_file: "session.json".to_string(),
            log_file_path: "logs/safemiles_plans.log".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("SAFEMILES_API_URL") {
            config.api_url = url;
        }
        if let Some(secs) = lookup("SAFEMILES_TIMEOUT_SECS") {
            config.timeout = parse_secs("SAFEMILES_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("SAFEMILES_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs("SAFEMILES_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("SAFEMILES_POLL_INTERVAL_SECS") {
            config.poll_interval = parse_secs("SAFEMILES_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(path) = lookup("SAFEMILES_SESSION_FILE") {
            config.session_file = path;
        }
        if let Some(path) = lookup("LOG_FILE_PATH") {
            config.log_file_path = path;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got {value:?}"))?;
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(Duration::from_secs(secs))
}
