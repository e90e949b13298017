//! Service configuration, read once at startup and handed to constructors.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout";
pub const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub endpoint: String,
    pub results_per_query: u32,
    pub timeout: Duration,
    /// Attempt budget of the retrying multi-source search
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
    /// Upper bound on cached movies
    pub max_entries: usize,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub openrouter_api_key: String,
    pub model_name: String,
    pub model_timeout: Duration,
    pub max_tool_rounds: usize,
    pub search: SearchConfig,
    pub cache: CacheConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", 3000)?,
            openrouter_api_key: required("OPENROUTER_API_KEY")?,
            model_name: lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_timeout: Duration::from_secs(parse_or(&lookup, "MODEL_TIMEOUT_SECS", 60)?),
            max_tool_rounds: parse_or(&lookup, "MAX_TOOL_ROUNDS", 4)?,
            search: SearchConfig {
                api_key: required("SERPER_API_KEY")?,
                endpoint: SERPER_ENDPOINT.to_string(),
                results_per_query: 15,
                timeout: Duration::from_secs(parse_or(&lookup, "SEARCH_TIMEOUT_SECS", 30)?),
                max_attempts: 3,
                retry_delay: Duration::from_millis(parse_or(&lookup, "SEARCH_RETRY_DELAY_MS", 2000)?),
            },
            cache: CacheConfig {
                enabled: parse_flag(&lookup, "ENABLE_CACHING", true)?,
                ttl: Duration::from_secs(parse_or(&lookup, "CACHE_TTL", 3600)?),
                max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", 1000)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "or-key"),
            ("SERPER_API_KEY", "serper-key"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.model_name, DEFAULT_MODEL);
        assert_eq!(config.max_tool_rounds, 4);
        assert_eq!(config.search.max_attempts, 3);
        assert_eq!(config.search.retry_delay, Duration::from_secs(2));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.max_entries, 1000);
    }

    #[test]
    fn missing_keys_and_bad_values_are_reported() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("SERPER_API_KEY", "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENROUTER_API_KEY"));

        let err = ServiceConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "k"),
            ("SERPER_API_KEY", "k"),
            ("ENABLE_CACHING", "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "ENABLE_CACHING", .. }));

        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "k"),
            ("SERPER_API_KEY", "k"),
            ("ENABLE_CACHING", "false"),
            ("MAX_TOOL_ROUNDS", " 2 "),
        ]))
        .unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.max_tool_rounds, 2);
    }
}
