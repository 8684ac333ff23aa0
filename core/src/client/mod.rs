//! Client library for fetching published prompts and filling their variables.

use crate::api::{ErrorBody, PromptRequest};
use crate::config::ClientConfig;
use crate::error::{ErrorCode, PromptError, Result};
use crate::logger::Logger;
use crate::template::Prompt;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

mod cache;

pub use cache::PromptCache;

const PROMPT_ENDPOINT: &str = "/api/prompt";

/// Somewhere prompts can be fetched from by key.
pub trait PromptSource {
    fn fetch(&self, prompt_key: &str) -> Result<Prompt>;
}

impl<F> PromptSource for F
where
    F: Fn(&str) -> Result<Prompt>,
{
    fn fetch(&self, prompt_key: &str) -> Result<Prompt> {
        self(prompt_key)
    }
}

/// Fetches prompts from the prompt API over HTTP.
pub struct HttpPromptSource {
    http: reqwest::blocking::Client,
    config: ClientConfig,
}

impl HttpPromptSource {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PromptError::Http {
                code: ErrorCode::TransportFailed,
                message: format!("Failed to build HTTP client: {e}"),
                status: None,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl PromptSource for HttpPromptSource {
    fn fetch(&self, prompt_key: &str) -> Result<Prompt> {
        let body = PromptRequest {
            prompt_key: Some(prompt_key.to_string()),
            project_key: self.config.project_key.clone(),
        };

        let response = self
            .http
            .post(self.config.endpoint(PROMPT_ENDPOINT))
            .json(&body)
            .send()
            .map_err(|e| PromptError::Http {
                code: ErrorCode::TransportFailed,
                message: format!("Failed to get prompt: {e}"),
                status: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .map(|b| format!(": {}", b.error))
                .unwrap_or_default();
            return Err(PromptError::Http {
                code: ErrorCode::UnexpectedStatus,
                message: format!("Failed to get prompt: server answered {status}{detail}"),
                status: Some(status.as_u16()),
            });
        }

        response.json::<Prompt>().map_err(|e| PromptError::Http {
            code: ErrorCode::TransportFailed,
            message: format!("Failed to get prompt: invalid response body: {e}"),
            status: Some(status.as_u16()),
        })
    }
}

/// Prompt client with an optional time-to-live cache in front of the source.
pub struct PromptClient<S> {
    source: S,
    cache: Option<PromptCache>,
    logger: Logger,
}

impl PromptClient<HttpPromptSource> {
    /// HTTP client built from `config`, caching when `cache_ttl_secs` is set.
    pub fn from_config(config: ClientConfig, logger: Logger) -> Result<Self> {
        let ttl = config.cache_ttl_secs;
        let client = Self::new(HttpPromptSource::new(config)?, logger);
        Ok(match ttl {
            Some(secs) => client.with_cache_ttl(secs),
            None => client,
        })
    }
}

impl<S: PromptSource> PromptClient<S> {
    pub fn new(source: S, logger: Logger) -> Self {
        Self { source, cache: None, logger }
    }

    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache = Some(PromptCache::new(ttl_secs));
        self
    }

    pub fn get_prompt(&mut self, prompt_key: &str) -> Result<Prompt> {
        self.get_prompt_at(prompt_key, Utc::now())
    }

    /// Fetches `prompt_key` and fills in `values`.
    pub fn format(&mut self, prompt_key: &str, values: &BTreeMap<String, String>) -> Result<String> {
        let prompt = self.get_prompt(prompt_key)?;
        prompt.format(values).inspect_err(|e| self.logger.error("client", "format", &e.to_string()))
    }

    pub fn invalidate(&mut self, prompt_key: &str) {
        if let Some(cache) = self.cache.as_mut() {
            cache.remove(prompt_key);
        }
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    fn get_prompt_at(&mut self, prompt_key: &str, now: DateTime<Utc>) -> Result<Prompt> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(prompt_key, now)) {
            self.logger.info("client", "cache_hit", prompt_key);
            return Ok(hit.clone());
        }

        let prompt = self
            .source
            .fetch(prompt_key)
            .inspect_err(|e| self.logger.error("client", "fetch", &e.to_string()))?;
        self.logger.info(
            "client",
            "fetch",
            &format!("prompt_key={prompt_key}, variables=[{}]", prompt.variables),
        );

        if let Some(cache) = self.cache.as_mut() {
            let purged = cache.purge_expired(now);
            if purged > 0 {
                self.logger.info(
                    "client",
                    "cache_purge",
                    &format!("purged={purged}, remaining={}", cache.len()),
                );
            }
            cache.insert(prompt_key, prompt.clone(), now);
        }
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl PromptSource for CountingSource {
        fn fetch(&self, prompt_key: &str) -> Result<Prompt> {
            self.calls.set(self.calls.get() + 1);
            match prompt_key {
                "greeting" => Ok(Prompt::new("Hello {{a}} and {{b}}")),
                _ => Err(PromptError::Http {
                    code: ErrorCode::UnexpectedStatus,
                    message: "Failed to get prompt: server answered 404 Not Found: Prompt not found".into(),
                    status: Some(404),
                }),
            }
        }
    }

    fn counting() -> CountingSource {
        CountingSource { calls: Cell::new(0) }
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn formats_fetched_prompts() {
        let mut client = PromptClient::new(counting(), Logger::discard());
        let text = client.format("greeting", &values(&[("a", "1"), ("b", "2")])).unwrap();
        assert_eq!(text, "Hello 1 and 2");
    }

    #[test]
    fn missing_values_surface_as_missing_variables() {
        let mut client = PromptClient::new(counting(), Logger::discard());
        let err = client.format("greeting", &values(&[("a", "1")])).unwrap_err();
        assert_eq!(err.to_string(), "Missing required variables: b. All required variables: a, b");
    }

    #[test]
    fn fetch_errors_are_passed_through() {
        let mut client = PromptClient::new(counting(), Logger::discard());
        let err = client.get_prompt("unknown").unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn without_a_cache_every_call_fetches() {
        let mut client = PromptClient::new(counting(), Logger::discard());
        client.get_prompt("greeting").unwrap();
        client.get_prompt("greeting").unwrap();
        assert_eq!(client.source.calls.get(), 2);
    }

    #[test]
    fn cached_prompts_are_reused_until_they_expire() {
        let mut client = PromptClient::new(counting(), Logger::discard()).with_cache_ttl(30);
        let start = Utc::now();

        client.get_prompt_at("greeting", start).unwrap();
        client.get_prompt_at("greeting", start + Duration::seconds(10)).unwrap();
        assert_eq!(client.source.calls.get(), 1);

        client.get_prompt_at("greeting", start + Duration::seconds(31)).unwrap();
        assert_eq!(client.source.calls.get(), 2);

        client.invalidate("greeting");
        client.get_prompt_at("greeting", start + Duration::seconds(32)).unwrap();
        assert_eq!(client.source.calls.get(), 3);
    }

    #[test]
    fn stale_entries_are_dropped_when_fetching() {
        let source = |key: &str| -> Result<Prompt> { Ok(Prompt::new(key)) };
        let mut client = PromptClient::new(source, Logger::discard()).with_cache_ttl(30);
        let start = Utc::now();

        client.get_prompt_at("first", start).unwrap();
        client.get_prompt_at("second", start + Duration::seconds(20)).unwrap();
        assert_eq!(client.cache.as_ref().map(PromptCache::len), Some(2));

        client.get_prompt_at("third", start + Duration::seconds(40)).unwrap();
        assert_eq!(client.cache.as_ref().map(PromptCache::len), Some(2));
        let cache = client.cache.as_ref().unwrap();
        assert!(cache.get("first", start).is_none());
        assert!(cache.get("second", start + Duration::seconds(40)).is_some());
    }

    #[test]
    fn failed_fetches_are_not_cached() {
        let mut client = PromptClient::new(counting(), Logger::discard()).with_cache_ttl(30);
        assert!(client.get_prompt("unknown").is_err());
        assert!(client.get_prompt("unknown").is_err());
        assert_eq!(client.source.calls.get(), 2);
    }

    #[test]
    fn closures_are_sources() {
        let source = |key: &str| -> Result<Prompt> { Ok(Prompt::new(format!("{key}: {{{{x}}}}"))) };
        let mut client = PromptClient::new(source, Logger::discard());
        assert_eq!(client.format("k", &values(&[("x", "y")])).unwrap(), "k: y");
    }

    #[test]
    fn http_source_rejects_invalid_config() {
        let err = HttpPromptSource::new(ClientConfig::new("not a url")).err().unwrap();
        assert!(matches!(err, PromptError::Config { .. }));
    }
}
