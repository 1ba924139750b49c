//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use chrono_tz::Tz;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Upper bound for `SESSION_TTL_DAYS`, ten years.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Loads the demo user and habit into the in-memory store at startup.
    pub seed_demo_data: bool,
    pub log_level: Level,
    /// The zone in which completion timestamps are truncated to days.
    pub streak_timezone: Tz,
    pub session_ttl_days: i64,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub cors_origin: HeaderValue,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address: SocketAddr = parse_or(&lookup, "BIND_ADDRESS", "0.0.0.0:3000".parse().ok())?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let database_max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", Some(5))?;
        let seed_demo_data: bool = parse_or(&lookup, "SEED_DEMO_DATA", Some(false))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Streak Settings ---
        let streak_timezone = match lookup("STREAK_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|_| {
                ConfigError::InvalidValue(
                    "STREAK_TIMEZONE".to_string(),
                    format!("'{}' is not an IANA time zone", name),
                )
            })?,
            None => Tz::UTC,
        };

        // --- Auth and Rate Limiting ---
        let session_ttl_days: i64 = parse_or(&lookup, "SESSION_TTL_DAYS", Some(30))?;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&session_ttl_days) {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                format!("must be between 1 and {}", MAX_SESSION_TTL_DAYS),
            ));
        }
        let rate_limit_max: u32 = parse_or(&lookup, "RATE_LIMIT_MAX", Some(100))?;
        let rate_limit_window_secs: u64 = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", Some(3600))?;

        let cors_origin_str =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let cors_origin = cors_origin_str.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
        })?;

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            seed_demo_data,
            log_level,
            streak_timezone,
            session_ttl_days,
            rate_limit_max,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            cors_origin,
        })
    }
}

/// Parses `key` when present, otherwise falls back to `default`.
fn parse_or<T, F>(lookup: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}
