use {
    crate::{connection::ReconnectConfig, feed::FeedSettings},
    std::{env, path::PathBuf, str::FromStr, time::Duration},
};

pub const DEFAULT_WS_URL: &str = "wss://www.nanolooker.com/ws";

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub ws_url: String,
    pub known_accounts_url: Option<String>,
    pub known_accounts_refresh: Duration,
    pub timeline_capacity: usize,
    pub tick_interval: Duration,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
    pub reconnect_jitter: f64,
    pub preferences_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `NANOFEED_WS_URL` (default: wss://www.nanolooker.com/ws)
    /// - `KNOWN_ACCOUNTS_URL` (default: unset, no aliases)
    /// - `KNOWN_ACCOUNTS_REFRESH_SECS` (default: 300)
    /// - `TIMELINE_CAPACITY` (default: 100)
    /// - `TICK_INTERVAL_MS` (default: 1000)
    /// - `RECONNECT_INITIAL_MS` (default: 500)
    /// - `RECONNECT_MAX_MS` (default: 30000)
    /// - `RECONNECT_JITTER` (default: 0.2)
    /// - `PREFERENCES_PATH` (default: preferences.json)
    pub fn from_env() -> Result<Self, ConfigError> {
        let ws_url = env::var("NANOFEED_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());

        if !ws_url.starts_with("ws://") && !ws_url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue(
                "NANOFEED_WS_URL must start with ws:// or wss://".to_string(),
            ));
        }

        let known_accounts_url = env::var("KNOWN_ACCOUNTS_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            ws_url,
            known_accounts_url,
            known_accounts_refresh: Duration::from_secs(parse_or("KNOWN_ACCOUNTS_REFRESH_SECS", 300)),
            timeline_capacity: parse_or("TIMELINE_CAPACITY", 100),
            tick_interval: Duration::from_millis(parse_or("TICK_INTERVAL_MS", 1_000)),
            reconnect_initial: Duration::from_millis(parse_or("RECONNECT_INITIAL_MS", 500)),
            reconnect_max: Duration::from_millis(parse_or("RECONNECT_MAX_MS", 30_000)),
            reconnect_jitter: parse_or("RECONNECT_JITTER", 0.2),
            preferences_path: PathBuf::from(
                env::var("PREFERENCES_PATH").unwrap_or_else(|_| "preferences.json".to_string()),
            ),
        })
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            capacity: self.timeline_capacity,
            tick_interval: self.tick_interval,
            reconnect: ReconnectConfig {
                initial_delay: self.reconnect_initial,
                max_delay: self.reconnect_max,
                jitter: self.reconnect_jitter,
            },
            ..Default::default()
        }
    }
}

/// Log filter from `RUST_LOG`, `info` when unset or blank.
///
/// Read on its own so the logger can start before `Config::from_env`
/// reports bad values.
pub fn log_filter() -> String {
    env::var("RUST_LOG")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Parse `var`, falling back to `default` when unset or invalid
fn parse_or<T: FromStr + Copy + std::fmt::Display>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', defaulting to {}", var, raw, default);
            default
        }),
        Err(_) => default,
    }
}
