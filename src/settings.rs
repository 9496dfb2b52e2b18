use once_cell::sync::Lazy;
use std::{env, time::Duration};

/// Holds all tunables, read-once from ENV with fallbacks.
pub struct Settings {
    pub port: u16,
    pub request_timeout: Duration,
    pub status_timeout: Duration,
    pub search_timeout: Duration,
    pub retries: u32,
    pub busy_retries: u32,
    pub poll_idle_interval: Duration,
    pub poll_active_interval: Duration,
    pub refresh_cooldown: Duration,
    pub list_limit: u32,
}

impl Settings {
    fn from_env() -> Self {
        // optionally load .env
        let _ = dotenvy::dotenv();

        fn parse_u32(var: &str, default: u32) -> u32 {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn parse_port(var: &str, default: u16) -> u16 {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        // helper to parse seconds into Duration
        fn parse_secs(var: &str, default_secs: u64) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(default_secs))
        }

        // helper to parse millis into Duration
        fn parse_millis(var: &str, default_ms: u64) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(default_ms))
        }

        Settings {
            port: parse_port("ZIDOO_PORT", 9529),
            request_timeout: parse_secs("ZIDOO_REQUEST_TIMEOUT_SECS", 5),
            status_timeout: parse_secs("ZIDOO_STATUS_TIMEOUT_SECS", 1),
            search_timeout: parse_secs("ZIDOO_SEARCH_TIMEOUT_SECS", 10),
            retries: parse_u32("ZIDOO_RETRIES", 3),
            busy_retries: parse_u32("ZIDOO_BUSY_RETRIES", 3),
            poll_idle_interval: parse_secs("ZIDOO_POLL_IDLE_SECS", 5),
            poll_active_interval: parse_secs("ZIDOO_POLL_ACTIVE_SECS", 1),
            refresh_cooldown: parse_millis("ZIDOO_REFRESH_COOLDOWN_MS", 1_000),
            list_limit: parse_u32("ZIDOO_LIST_LIMIT", 250),
        }
    }
}

/// Global settings instance
pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);
