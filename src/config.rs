use std::time::Duration;

/// Environment name under which missing service URLs fall back to localhost.
const DEVELOPMENT_ENV: &str = "development";

const DEFAULT_DEV_ML_SERVICE_URL: &str = "http://localhost:8000";
const DEFAULT_GEOCODING_API_URL: &str = "https://geocoding-api.open-meteo.com";
const DEFAULT_WEATHER_API_URL: &str = "https://api.open-meteo.com";

const DEFAULT_GEOCODING_TIMEOUT_SECS: u64 = 8;
const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 8;
const DEFAULT_PREDICTION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment (`development`, `staging`, `production`, ...).
    pub app_env: String,
    pub database_url: String,
    pub port: u16,
    /// Base URL of the crop prediction service (`/predict`, `/health`).
    pub ml_service_url: String,
    pub geocoding_api_url: String,
    pub weather_api_url: String,
    /// ISO 3166-1 alpha-2 code used to restrict geocoding matches.
    pub geocoding_country_code: String,
    pub geocoding_language: String,
    pub geocoding_timeout: Duration,
    pub weather_timeout: Duration,
    pub prediction_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `ML_SERVICE_URL` is only defaulted in the development environment;
    /// everywhere else a missing value is a startup error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| DEVELOPMENT_ENV.to_string());

        let ml_service_url = match lookup("ML_SERVICE_URL") {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ if app_env == DEVELOPMENT_ENV => DEFAULT_DEV_ML_SERVICE_URL.to_string(),
            _ => return Err(ConfigError::Missing("ML_SERVICE_URL")),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            port: parse_or(&lookup, "PORT", 8080)?,
            ml_service_url,
            geocoding_api_url: lookup("GEOCODING_API_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODING_API_URL.to_string()),
            weather_api_url: lookup("WEATHER_API_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            geocoding_country_code: lookup("GEOCODING_COUNTRY_CODE")
                .unwrap_or_else(|| "IN".to_string()),
            geocoding_language: lookup("GEOCODING_LANGUAGE").unwrap_or_else(|| "en".to_string()),
            geocoding_timeout: Duration::from_secs(parse_or(
                &lookup,
                "GEOCODING_TIMEOUT_SECS",
                DEFAULT_GEOCODING_TIMEOUT_SECS,
            )?),
            weather_timeout: Duration::from_secs(parse_or(
                &lookup,
                "WEATHER_TIMEOUT_SECS",
                DEFAULT_WEATHER_TIMEOUT_SECS,
            )?),
            prediction_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PREDICTION_TIMEOUT_SECS",
                DEFAULT_PREDICTION_TIMEOUT_SECS,
            )?),
            app_env,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
