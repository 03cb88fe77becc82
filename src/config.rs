use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NotehubError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://notehub-public.goit.study/api";
pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 800;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Runtime configuration shared by the client core, the prefetch server and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote Notes API (without trailing slash)
    pub api_base_url: String,
    /// Notes per list page
    pub page_size: u32,
    /// Quiet period before a search edit triggers a fetch
    #[serde(with = "millis")]
    pub search_debounce: Duration,
    /// Per-request timeout for the HTTP client
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    /// Listen address for the prefetch server
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `NOTEHUB_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("NOTEHUB_API_URL") {
            config.api_base_url = url;
        }
        if let Some(size) = lookup("NOTEHUB_PAGE_SIZE") {
            config.page_size = parse_var("NOTEHUB_PAGE_SIZE", &size)?;
        }
        if let Some(ms) = lookup("NOTEHUB_DEBOUNCE_MS") {
            config.search_debounce = Duration::from_millis(parse_var("NOTEHUB_DEBOUNCE_MS", &ms)?);
        }
        if let Some(secs) = lookup("NOTEHUB_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_var("NOTEHUB_TIMEOUT_SECS", &secs)?);
        }
        if let Some(bind) = lookup("NOTEHUB_BIND") {
            config.bind = bind;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(NotehubError::Config("page_size must be at least 1".to_string()));
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(NotehubError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| NotehubError::Config(format!("{} has an invalid value: '{}'", name, value)))
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
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
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.search_debounce, Duration::from_millis(800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("NOTEHUB_API_URL", "http://localhost:4000/"),
            ("NOTEHUB_PAGE_SIZE", "5"),
            ("NOTEHUB_DEBOUNCE_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.api_base(), "http://localhost:4000");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_invalid_env_value() {
        let err = Config::from_lookup(lookup_from(&[("NOTEHUB_PAGE_SIZE", "many")])).unwrap_err();
        assert!(err.to_string().contains("NOTEHUB_PAGE_SIZE"));

        let err = Config::from_lookup(lookup_from(&[("NOTEHUB_PAGE_SIZE", "0")])).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = Config::from_lookup(lookup_from(&[("NOTEHUB_API_URL", "ftp://notes")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_serialization() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["search_debounce"], 800);
        let parsed: Config = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }
}
