//! Runtime configuration loaded from the environment
//!
//! Binaries call `dotenv::dotenv()` first, so a local `.env` file works the
//! same as exported variables.

use crate::error::AssistantError;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_SEARCH_URL: &str = "https://api.duckduckgo.com";

/// Which search backend grounds the web search agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    DuckDuckGo,
    None,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub market_data_base_url: String,
    pub cache_ttl_secs: i64,
    pub search_backend: SearchBackend,
    pub search_base_url: String,
    pub http_timeout: Duration,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            groq_base_url: DEFAULT_GROQ_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            market_data_base_url: DEFAULT_MARKET_DATA_URL.to_string(),
            cache_ttl_secs: 300,
            search_backend: SearchBackend::DuckDuckGo,
            search_base_url: DEFAULT_SEARCH_URL.to_string(),
            http_timeout: Duration::from_secs(30),
            port: 8080,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let search_backend = match get("SEARCH_PROVIDER").map(|v| v.to_lowercase()) {
            None => defaults.search_backend,
            Some(v) if v == "duckduckgo" || v == "ddg" => SearchBackend::DuckDuckGo,
            Some(v) if v == "none" || v == "llm" => SearchBackend::None,
            Some(other) => {
                return Err(AssistantError::Config(format!(
                    "SEARCH_PROVIDER must be 'duckduckgo' or 'none', got '{}'",
                    other
                )))
            }
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => defaults.port,
        };

        Ok(Self {
            groq_api_key: get("GROQ_API_KEY").map(|k| k.trim().to_string()),
            groq_base_url: get("GROQ_BASE_URL").unwrap_or(defaults.groq_base_url),
            model: get("GROQ_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_or("GROQ_MAX_TOKENS", get("GROQ_MAX_TOKENS"), defaults.max_tokens)?,
            temperature: parse_or(
                "GROQ_TEMPERATURE",
                get("GROQ_TEMPERATURE"),
                defaults.temperature,
            )?,
            market_data_base_url: get("MARKET_DATA_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.market_data_base_url),
            cache_ttl_secs: parse_or(
                "MARKET_CACHE_TTL_SECS",
                get("MARKET_CACHE_TTL_SECS"),
                defaults.cache_ttl_secs,
            )?,
            search_backend,
            search_base_url: get("SEARCH_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.search_base_url),
            http_timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                30u64,
            )?),
            port,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.groq_api_key.is_some()
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        AssistantError::Config(format!("{} has an invalid value: '{}'", key, raw))
    })
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
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
    fn test_defaults_without_env() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert!(!settings.has_api_key());
        assert_eq!(settings.model, "llama3-70b-8192");
        assert_eq!(settings.max_tokens, 1000);
        assert_eq!(settings.cache_ttl_secs, 300);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.search_backend, SearchBackend::DuckDuckGo);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let settings = Settings::from_lookup(lookup_from(&[("GROQ_API_KEY", "  ")])).unwrap();
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("API_PORT", "9090"),
            ("MARKET_CACHE_TTL_SECS", "60"),
            ("SEARCH_PROVIDER", "none"),
            ("MARKET_DATA_BASE_URL", "http://localhost:1234/"),
        ]))
        .unwrap();

        assert_eq!(settings.groq_api_key.as_deref(), Some("gsk_test"));
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.cache_ttl_secs, 60);
        assert_eq!(settings.search_backend, SearchBackend::None);
        assert_eq!(settings.market_data_base_url, "http://localhost:1234");
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = Settings::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, AssistantError::Config(_)));
    }
}
