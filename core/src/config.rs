use crate::error::{PromptError, Result};
use serde::Deserialize;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "PROMPTIC_BASE_URL";
pub const ENV_PROJECT_KEY: &str = "PROMPTIC_PROJECT_KEY";
pub const ENV_CACHE_TTL_SECS: &str = "PROMPTIC_CACHE_TTL_SECS";
pub const ENV_TIMEOUT_SECS: &str = "PROMPTIC_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:5001";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 300;

/// Settings for [`crate::client::PromptClient`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub base_url: String,
    pub project_key: Option<String>,
    /// Cache fetched prompts for this long; `None` disables caching.
    pub cache_ttl_secs: Option<u64>,
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Reads overrides from `PROMPTIC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(key) = lookup(ENV_PROJECT_KEY).filter(|k| !k.trim().is_empty()) {
            config.project_key = Some(key);
        }
        if let Some(ttl) = lookup(ENV_CACHE_TTL_SECS) {
            config.cache_ttl_secs = Some(parse_secs(ENV_CACHE_TTL_SECS, &ttl)?);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_secs(ENV_TIMEOUT_SECS, &timeout)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PromptError::Config {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
                reason: "must be an http:// or https:// URL".to_string(),
            });
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(PromptError::Config {
                field: "timeout_secs".to_string(),
                value: self.timeout_secs.to_string(),
                reason: format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoint URL under the configured base, without duplicate slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim().trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_key: None,
            cache_ttl_secs: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn parse_secs(field: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| PromptError::Config {
        field: field.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl_secs, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://prompts.example.com/"),
            (ENV_PROJECT_KEY, "proj-1"),
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.project_key.as_deref(), Some("proj-1"));
        assert_eq!(config.cache_ttl_secs, Some(60));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.endpoint("/api/prompt"), "https://prompts.example.com/api/prompt");
    }

    #[test]
    fn bad_numbers_are_reported_with_their_field() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_CACHE_TTL_SECS, "soon")])).unwrap_err();
        match err {
            PromptError::Config { field, value, .. } => {
                assert_eq!(field, ENV_CACHE_TTL_SECS);
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_http_urls_and_zero_timeouts() {
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        let config = ClientConfig { timeout_secs: 0, ..ClientConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"baseUrl":"http://api","cacheTtlSecs":10}"#).unwrap();
        assert_eq!(config.base_url, "http://api");
        assert_eq!(config.cache_ttl_secs, Some(10));
        assert_eq!(config.timeout_secs, 30);
    }
}
