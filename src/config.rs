use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Distinguishes runtime behavior for different stages of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub query_service: QueryServiceConfig,
    pub listings: ListingsConfig,
    /// Pre-issued identity provider token, if any
    pub access_token: Option<String>,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("HOME_SCOUT_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let query_url = parse_url(
            "HOME_SCOUT_QUERY_API_URL",
            &env::var("HOME_SCOUT_QUERY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        )?;
        let listings_url = match env::var("HOME_SCOUT_LISTINGS_API_URL") {
            Ok(value) => parse_url("HOME_SCOUT_LISTINGS_API_URL", &value)?,
            Err(_) => query_url.clone(),
        };

        let timeout = parse_timeout(
            &env::var("HOME_SCOUT_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string()),
        )?;

        let access_token = env::var("HOME_SCOUT_ACCESS_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let log_level = env::var("HOME_SCOUT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            query_service: QueryServiceConfig {
                base_url: query_url,
                timeout,
            },
            listings: ListingsConfig {
                base_url: listings_url,
                timeout,
            },
            access_token,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the natural-language query service lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct QueryServiceConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl QueryServiceConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(Self {
            base_url: parse_url("query service url", base_url)?,
            timeout,
        })
    }
}

/// Listing store API settings.
#[derive(Debug, Clone)]
pub struct ListingsConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: '{value}'")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{name} must use http or https, got '{value}'")]
    UnsupportedScheme { name: &'static str, value: String },
    #[error("HOME_SCOUT_REQUEST_TIMEOUT_SECS must be a positive number of seconds")]
    InvalidTimeout,
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("HOME_SCOUT_ENV");
        env::remove_var("HOME_SCOUT_QUERY_API_URL");
        env::remove_var("HOME_SCOUT_LISTINGS_API_URL");
        env::remove_var("HOME_SCOUT_REQUEST_TIMEOUT_SECS");
        env::remove_var("HOME_SCOUT_ACCESS_TOKEN");
        env::remove_var("HOME_SCOUT_LOG_LEVEL");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.query_service.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.listings.base_url, config.query_service.base_url);
        assert_eq!(config.query_service.timeout, Duration::from_secs(30));
        assert!(config.access_token.is_none());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn listings_url_can_differ_from_query_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HOME_SCOUT_QUERY_API_URL", "http://nlq.internal:9000");
        env::set_var("HOME_SCOUT_LISTINGS_API_URL", "https://listings.example.com/v1");
        env::set_var("HOME_SCOUT_ENV", "prod");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.query_service.base_url.host_str(), Some("nlq.internal"));
        assert_eq!(config.listings.base_url.path(), "/v1");
        reset_env();
    }

    #[test]
    fn rejects_zero_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HOME_SCOUT_REQUEST_TIMEOUT_SECS", "0");
        let err = AppConfig::load().expect_err("zero timeout is rejected");
        assert!(matches!(err, ConfigError::InvalidTimeout));
        reset_env();
    }

    #[test]
    fn rejects_non_http_urls() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HOME_SCOUT_QUERY_API_URL", "ftp://example.com");
        let err = AppConfig::load().expect_err("ftp is not accepted");
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
        reset_env();
    }

    #[test]
    fn blank_access_token_is_ignored() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HOME_SCOUT_ACCESS_TOKEN", "   ");
        let config = AppConfig::load().expect("config loads");
        assert!(config.access_token.is_none());
        reset_env();
    }
}
