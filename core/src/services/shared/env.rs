use std::{path::PathBuf, str::FromStr};

use dotenvy::{dotenv, from_filename, var};
use tracing::info;

use super::constants::{
    CACHE_SIZE, DEFAULT_EXCHANGE_RATES_URL, DEFAULT_PORT, DEFAULT_STORAGE_DIR, MAX_BACKTRACK_DAYS,
    MAX_HTTP_RETRIES,
};
use crate::{
    error::{ReportError, Result},
    services::storage::StorageType,
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub exchange_rates_url: String,
    pub storage_type: StorageType,
    pub storage_dir: PathBuf,
    pub bucket_id: Option<String>,
    pub max_backtrack_days: u32,
    pub max_http_retries: u32,
    pub cache_size: usize,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            exchange_rates_url: DEFAULT_EXCHANGE_RATES_URL.to_string(),
            storage_type: StorageType::Disabled,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            bucket_id: None,
            max_backtrack_days: MAX_BACKTRACK_DAYS,
            max_http_retries: MAX_HTTP_RETRIES,
            cache_size: CACHE_SIZE,
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(get_env_variable)
    }

    /// Builds and validates settings from any key/value source, unset keys
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let settings = Settings {
            exchange_rates_url: lookup("EXCHANGE_RATES_URL").unwrap_or(defaults.exchange_rates_url),
            storage_type: match lookup("STORAGE_TYPE") {
                Some(value) => value.parse()?,
                None => defaults.storage_type,
            },
            storage_dir: lookup("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            bucket_id: lookup("BUCKET_ID").filter(|bucket| !bucket.is_empty()),
            max_backtrack_days: parse_or(&lookup, "MAX_BACKTRACK_DAYS", defaults.max_backtrack_days)?,
            max_http_retries: parse_or(&lookup, "MAX_HTTP_RETRIES", defaults.max_http_retries)?,
            cache_size: parse_or(&lookup, "CACHE_SIZE", defaults.cache_size)?,
            port: parse_or(&lookup, "PORT", defaults.port)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        match (&self.bucket_id, self.storage_type.uses_bucket()) {
            (Some(bucket_id), false) => Err(ReportError::Configuration(format!(
                "[BUCKET_ID] set as '{}', but [STORAGE_TYPE] is set as '{}'. With a bucket [STORAGE_TYPE] needs to be set as [AWS|GCP].",
                bucket_id, self.storage_type
            ))),
            (None, true) => Err(ReportError::Configuration(format!(
                "[STORAGE_TYPE] is set as '{}', but [BUCKET_ID] is missing.",
                self.storage_type
            ))),
            _ => Ok(()),
        }
    }

    pub fn log_summary(&self) {
        info!("Exchange rates from {}", self.exchange_rates_url);
        match &self.bucket_id {
            Some(bucket_id) => info!("Storage: {} (bucket {})", self.storage_type, bucket_id),
            None => info!("Storage: {}", self.storage_type),
        }
        info!(
            "Rate lookback {} days, {} fetch retries, cache size {}",
            self.max_backtrack_days, self.max_http_retries, self.cache_size
        );
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ReportError::Configuration(format!("Invalid value '{}' for [{}]", value, key))),
        None => Ok(default),
    }
}

pub fn get_env_variable(variable_to_get: &str) -> Option<String> {
    let environment = var("RUST_ENV").unwrap_or_else(|_| "development".into());

    match environment.as_str() {
        "development" => from_filename(".env.dev").ok(),
        "production" => from_filename(".env.prod").ok(),
        _ => dotenv().ok(),
    };
    var(variable_to_get).ok()
}
