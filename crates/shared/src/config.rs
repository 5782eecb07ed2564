//! Environment-based configuration (spec §6 "Configuration").
//!
//! One typed config struct, built by [`MosaicConfig::from_env`]. The
//! database URL is the only required variable; everything else has a
//! default. Missing or malformed values fail startup loudly rather
//! than falling back silently.

use thiserror::Error;

use crate::config_env::{
    optional_trimmed_env, parse_bool_env, parse_u32_env, parse_u64_env, require_env,
};
use crate::models::PrivacyLevel;
use crate::timezone::{DEFAULT_USER_TIME_ZONE, WeekBoundary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid boolean in env var {0}")]
    ParseBool(String),
    #[error("invalid value in env var {0}: {1}")]
    ParseEnum(String, String),
}

#[derive(Debug, Clone)]
pub struct MosaicConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub scheduler_job_store_url: Option<String>,
    pub notification_bridge_url: Option<String>,
    pub notification_sound: String,
    pub notifications_enabled: bool,
    pub user_time_zone: String,
    pub default_week_boundary: WeekBoundary,
    pub default_privacy_level: PrivacyLevel,
}

impl MosaicConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_u32_env("DATABASE_MAX_CONNECTIONS", 5)?,
            scheduler_job_store_url: optional_trimmed_env("SCHEDULER_JOB_STORE_URL"),
            notification_bridge_url: optional_trimmed_env("NOTIFICATION_BRIDGE_URL"),
            notification_sound: optional_trimmed_env("NOTIFICATION_SOUND")
                .unwrap_or_else(|| "default".to_string()),
            notifications_enabled: parse_bool_env("NOTIFICATIONS_ENABLED", true)?,
            user_time_zone: optional_trimmed_env("USER_TIME_ZONE")
                .unwrap_or_else(|| DEFAULT_USER_TIME_ZONE.to_string()),
            default_week_boundary: parse_week_boundary_env("DEFAULT_WEEK_BOUNDARY")?,
            default_privacy_level: parse_privacy_level_env("DEFAULT_PRIVACY_LEVEL")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub tick_seconds: u64,
    pub database_url: String,
    pub database_max_connections: u32,
    pub notification_bridge_url: Option<String>,
    pub notification_sound: String,
    pub notifications_enabled: bool,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = MosaicConfig::from_env()?;
        Ok(Self {
            tick_seconds: parse_u64_env("WORKER_TICK_SECONDS", 30)?,
            database_url: base.database_url,
            database_max_connections: base.database_max_connections,
            notification_bridge_url: base.notification_bridge_url,
            notification_sound: base.notification_sound,
            notifications_enabled: base.notifications_enabled,
        })
    }
}

fn parse_week_boundary_env(key: &str) -> Result<WeekBoundary, ConfigError> {
    match optional_trimmed_env(key) {
        None => Ok(WeekBoundary::Monday),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "monday" => Ok(WeekBoundary::Monday),
            "sunday" => Ok(WeekBoundary::Sunday),
            _ => Err(ConfigError::ParseEnum(key.to_string(), raw)),
        },
    }
}

fn parse_privacy_level_env(key: &str) -> Result<PrivacyLevel, ConfigError> {
    match optional_trimmed_env(key) {
        None => Ok(PrivacyLevel::default_for_creation()),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "public" => Ok(PrivacyLevel::Public),
            "internal" => Ok(PrivacyLevel::Internal),
            "private" => Ok(PrivacyLevel::Private),
            other => Err(ConfigError::ParseEnum(key.to_string(), other.to_string())),
        },
    }
}
