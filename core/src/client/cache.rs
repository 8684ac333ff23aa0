use crate::template::Prompt;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct CachedPrompt {
    prompt: Prompt,
    fetched_at: DateTime<Utc>,
}

/// Time-to-live cache of fetched prompts keyed by prompt key.
#[derive(Debug, Clone)]
pub struct PromptCache {
    ttl: Duration,
    entries: HashMap<String, CachedPrompt>,
}

impl PromptCache {
    pub fn new(ttl_secs: u64) -> Self {
        let secs = ttl_secs.min(MAX_TTL_SECS) as i64;
        Self { ttl: Duration::seconds(secs), entries: HashMap::new() }
    }

    /// Fresh entry for `key`, if any. An entry is fresh while younger than the TTL.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<&Prompt> {
        self.entries
            .get(key)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| &entry.prompt)
    }

    pub fn insert(&mut self, key: &str, prompt: Prompt, now: DateTime<Utc>) {
        self.entries.insert(key.to_string(), CachedPrompt { prompt, fetched_at: now });
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops stale entries and returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.fetched_at < ttl);
        before - self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
