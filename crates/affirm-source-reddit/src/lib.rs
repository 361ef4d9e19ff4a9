// # Reddit Feed Source
//
// This crate provides the Reddit listing source for the affirmation service.
//
// ## Behavior
//
// - One HTTP GET per `fetch` call: `/r/{topic}/top.json?t={timeframe}&limit={limit}`
// - Request timeout and `User-Agent` come from `SourceConfig`
// - Transport errors, non-2xx statuses and malformed listings all map to
//   `Error::SourceUnavailable` for that topic
// - No retries, no caching, no background tasks; the refresh cycle owns all of that
//
// ## Listing Format
//
// ```json
// { "kind": "Listing",
//   "data": { "children": [ { "kind": "t3", "data": { "title": "...", "ups": 12 } } ] } }
// ```
//
// Children whose `data` is not a post object are skipped, not fatal.

use affirm_core::config::SourceConfig;
use affirm_core::{Error, FeedSource, RawItem, Result, Timeframe};
use async_trait::async_trait;
use serde::Deserialize;

/// Reddit listing source
#[derive(Debug, Clone)]
pub struct RedditSource {
    /// Host that topic paths hang off, without a trailing slash
    base_url: String,

    /// HTTP client (timeout, user agent and redirects preconfigured)
    client: reqwest::Client,
}

impl RedditSource {
    /// Create a new Reddit source
    ///
    /// # Parameters
    ///
    /// - `config`: Base URL, user agent and request timeout
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: Invalid configuration or HTTP client setup failure
    pub fn new(config: &SourceConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Listing endpoint for one topic (query parameters excluded)
    pub fn listing_url(&self, topic: &str) -> String {
        format!("{}/r/{}/top.json", self.base_url, topic)
    }
}

#[async_trait]
impl FeedSource for RedditSource {
    async fn fetch(&self, topic: &str, limit: usize, timeframe: Timeframe) -> Result<Vec<RawItem>> {
        validate_topic(topic)?;

        let url = self.listing_url(topic);
        tracing::debug!("Fetching {} (t={}, limit={})", url, timeframe, limit);

        let response = self
            .client
            .get(&url)
            .query(&[("t", timeframe.as_str().to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| Error::source_unavailable(topic, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                403 => Error::source_unavailable(
                    topic,
                    format!("Access denied (private or quarantined topic). Status: {}", status),
                ),
                404 => Error::source_unavailable(topic, format!("Topic not found. Status: {}", status)),
                429 => Error::source_unavailable(
                    topic,
                    format!("Rate limit exceeded. Status: {}", status),
                ),
                500..=599 => Error::source_unavailable(
                    topic,
                    format!("Server error (transient). Status: {}", status),
                ),
                _ => Error::source_unavailable(topic, format!("HTTP error: {}", status)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::source_unavailable(topic, format!("Failed to read response: {}", e)))?;

        let items = parse_listing(topic, &body)?;
        tracing::debug!("Topic {} returned {} record(s)", topic, items.len());
        Ok(items)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn source_name(&self) -> &'static str {
        "reddit"
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    #[serde(default)]
    data: serde_json::Value,
}

/// Parse a listing document into raw records
///
/// A document that is not a listing fails the whole topic; a single child
/// that is not a post object is skipped.
pub fn parse_listing(topic: &str, body: &str) -> Result<Vec<RawItem>> {
    let listing: Listing = serde_json::from_str(body)
        .map_err(|e| Error::source_unavailable(topic, format!("Malformed listing: {}", e)))?;

    let mut items = Vec::with_capacity(listing.data.children.len());
    for child in listing.data.children {
        match serde_json::from_value::<RawItem>(child.data) {
            Ok(item) => items.push(item),
            Err(e) => tracing::debug!("Skipping malformed record in {}: {}", topic, e),
        }
    }

    Ok(items)
}

/// Reject identifiers that would not form a valid listing path
fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(Error::source_unavailable(topic, "Topic identifier cannot be empty"));
    }
    if !topic.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::source_unavailable(
            topic,
            "Topic identifier contains invalid characters. Valid: ASCII alphanumeric and underscore.",
        ));
    }
    Ok(())
}
