use std::{env, time::Duration};

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_LOG_FILTER: &str = "harvtech=info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("{name} must be a whole number of seconds, got {value}")]
    InvalidSeconds { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub log_filter: String,
}

impl AppConfig {
    /// Reads `HARVTECH_*` variables, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = parse_base_url(
            &lookup("HARVTECH_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let http_timeout = seconds(&lookup, "HARVTECH_HTTP_TIMEOUT_SECS")?
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        let cache_ttl = seconds(&lookup, "HARVTECH_CACHE_TTL_SECS")?
            .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
        let log_filter = lookup("HARVTECH_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            api_base_url,
            http_timeout,
            cache_ttl,
            log_filter,
        })
    }
}

/// Relative joins drop the last path segment unless the base ends in `/`.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|_| ConfigError::InvalidUrl {
        name: "HARVTECH_API_BASE_URL",
        value: raw.to_string(),
    })
}

fn seconds<F>(lookup: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidSeconds { name, value: raw })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.log_filter, "harvtech=info");
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = AppConfig::from_lookup(lookup(&[(
            "HARVTECH_API_BASE_URL",
            "https://api.harvtech.in/v1",
        )]))
        .unwrap();
        assert_eq!(
            config.api_base_url.join("api/bookings").unwrap().as_str(),
            "https://api.harvtech.in/v1/api/bookings"
        );
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("HARVTECH_API_BASE_URL", "not a url")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("HARVTECH_HTTP_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::InvalidSeconds {
                name: "HARVTECH_HTTP_TIMEOUT_SECS",
                value: "soon".to_string()
            })
        );
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HARVTECH_CACHE_TTL_SECS", "60"),
            ("HARVTECH_LOG", "harvtech=debug"),
        ]))
        .unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.log_filter, "harvtech=debug");
    }
}
