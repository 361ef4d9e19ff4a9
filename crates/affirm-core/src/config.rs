//! Configuration types for the affirmation service
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::Timeframe;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AffirmConfig {
    /// Feed identifiers polled on every refresh
    pub topics: Vec<String>,

    /// How long a snapshot is served before the next request refreshes it
    pub cache_ttl_secs: u64,

    /// Items requested from each topic
    pub per_topic_limit: usize,

    /// Window the feed's top listing is computed over
    pub timeframe: Timeframe,

    /// Longest acceptable line, in characters
    pub max_line_length: usize,

    /// Case-insensitive substrings that disqualify a line
    pub denylist_terms: Vec<String>,

    /// URL suffixes that mark a post as media
    pub media_extensions: Vec<String>,

    /// `post_hint` values that mark a post as media or a bare link
    pub blocked_post_hints: Vec<String>,

    /// Lines served before the first successful refresh
    pub fallback_items: Vec<String>,

    /// Source client settings
    pub source: SourceConfig,
}

impl AffirmConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            topics: default_topics(),
            cache_ttl_secs: 60 * 60,
            per_topic_limit: 100,
            timeframe: Timeframe::Month,
            max_line_length: 250,
            denylist_terms: strings(&["suicide", "politics", "trigger"]),
            media_extensions: strings(&[
                ".jpg", ".jpeg", ".png", ".gif", ".webp", ".mp4", ".gifv", ".webm",
            ]),
            blocked_post_hints: strings(&["image", "hosted:video", "rich:video", "link"]),
            fallback_items: default_fallback_items(),
            source: SourceConfig::default(),
        }
    }

    /// Load a configuration from a JSON file; absent fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Cache TTL as a [`Duration`]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.topics.is_empty() {
            return Err(crate::Error::config("No topics configured"));
        }
        if self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(crate::Error::config("Topic identifiers cannot be blank"));
        }
        if self.fallback_items.is_empty() {
            return Err(crate::Error::config(
                "Fallback items cannot be empty (the cache must never start empty)",
            ));
        }
        if self.fallback_items.iter().any(|line| line.trim().is_empty()) {
            return Err(crate::Error::config("Fallback items cannot be blank"));
        }
        if self.per_topic_limit == 0 {
            return Err(crate::Error::config("Per-topic limit must be > 0"));
        }
        if self.max_line_length == 0 {
            return Err(crate::Error::config("Max line length must be > 0"));
        }

        self.source.validate()?;

        Ok(())
    }
}

impl Default for AffirmConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Source client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Feed host that topic paths and relative permalinks hang off
    pub base_url: String,

    /// Client identifier sent with every request
    pub user_agent: String,

    /// Per-request timeout (in seconds)
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Per-request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.trim().is_empty() {
            return Err(crate::Error::config("Source base URL cannot be empty"));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(crate::Error::config(format!(
                "Source base URL is not a valid URL: {}",
                self.base_url
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(crate::Error::config("Source user agent cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Source timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: "FunnyAffirmationsBot/0.1".to_string(),
            timeout_secs: 20,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_topics() -> Vec<String> {
    strings(&[
        "UnusualAffirmations",
        "Affirmations",
        "PickupLines",
        "clevercomebacks",
        "Showerthoughts",
        "Oneliners",
        "dadjokes",
        "punny",
        "contagiouslaughter",
        "me_irl",
        "rareinsults",
        "2meirl4meirl",
        "firstworldanarchists",
        "funny",
    ])
}

fn default_fallback_items() -> Vec<String> {
    strings(&[
        "You are doing great, and your houseplants are rooting for you.",
        "Today you will find a parking spot exactly where you need it.",
        "Your browser tabs are a sign of a curious mind, not chaos.",
        "You are the human equivalent of a perfectly toasted bagel.",
        "Somewhere, a dog is thrilled that you exist.",
        "You have survived 100% of your worst days so far.",
    ])
}
