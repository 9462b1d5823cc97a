use std::collections::HashMap;
use thiserror::Error;

use crate::engine::heat::HeatParams;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub identity_api_url: String,
    pub decay_half_life_hours: f64,
    pub view_weight: f64,
    pub comment_weight: f64,
    pub view_dedup_window_minutes: i64,
    pub max_page_size: usize,
    pub expiry_sweep_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let identity_api_url = env_map
            .get("IDENTITY_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("IDENTITY_API_URL".to_string()))?;

        let decay_half_life_hours = parse_positive_f64(&env_map, "DECAY_HALF_LIFE_HOURS", "12")?;
        let view_weight = parse_non_negative_f64(&env_map, "VIEW_WEIGHT", "0.25")?;
        let comment_weight = parse_non_negative_f64(&env_map, "COMMENT_WEIGHT", "0.05")?;

        let view_dedup_window_minutes = env_map
            .get("VIEW_DEDUP_WINDOW_MINUTES")
            .map(|s| s.as_str())
            .unwrap_or("30")
            .parse::<i64>()
            .ok()
            .filter(|m| *m >= 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "VIEW_DEDUP_WINDOW_MINUTES".to_string(),
                    "must be a non-negative integer".to_string(),
                )
            })?;

        let max_page_size = env_map
            .get("MAX_PAGE_SIZE")
            .map(|s| s.as_str())
            .unwrap_or("100")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "MAX_PAGE_SIZE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let expiry_sweep_seconds = env_map
            .get("EXPIRY_SWEEP_SECONDS")
            .map(|s| s.as_str())
            .unwrap_or("60")
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "EXPIRY_SWEEP_SECONDS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            identity_api_url,
            decay_half_life_hours,
            view_weight,
            comment_weight,
            view_dedup_window_minutes,
            max_page_size,
            expiry_sweep_seconds,
        })
    }

    /// Heat tuning derived from this configuration.
    pub fn heat_params(&self) -> HeatParams {
        HeatParams {
            decay_half_life_hours: self.decay_half_life_hours,
            view_weight: self.view_weight,
            comment_weight: self.comment_weight,
        }
    }

    /// View dedup window in milliseconds.
    pub fn view_dedup_window_ms(&self) -> i64 {
        self.view_dedup_window_minutes * 60_000
    }
}

fn parse_positive_f64(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<f64, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| {
            ConfigError::InvalidValue(key.to_string(), "must be a positive number".to_string())
        })
}

fn parse_non_negative_f64(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<f64, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| {
            ConfigError::InvalidValue(key.to_string(), "must be a non-negative number".to_string())
        })
}
