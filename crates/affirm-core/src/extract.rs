//! Line extraction
//!
//! Turns one [`RawItem`] into at most one [`AffirmationItem`]:
//!
//! 1. Media posts (gallery, video, blocked `post_hint`, media file URL) are
//!    dropped regardless of their text.
//! 2. The trimmed title is used if it passes the [`ContentFilter`].
//! 3. Otherwise the first line of the trimmed body is used if it passes.
//! 4. Otherwise the item is dropped.

use url::Url;

use crate::config::AffirmConfig;
use crate::error::{Error, Result};
use crate::filter::ContentFilter;
use crate::types::{AffirmationItem, RawItem};

/// Derives candidate lines from raw feed records
#[derive(Debug, Clone)]
pub struct LineExtractor {
    filter: ContentFilter,

    /// Lowercased URL suffixes treated as media
    media_extensions: Vec<String>,

    /// Lowercased `post_hint` values treated as media
    blocked_post_hints: Vec<String>,

    /// Base that relative permalinks are resolved against
    base_url: Url,
}

impl LineExtractor {
    /// Create an extractor
    ///
    /// Fails if `base_url` is not an absolute URL.
    pub fn new(
        filter: ContentFilter,
        media_extensions: &[String],
        blocked_post_hints: &[String],
        base_url: &str,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            filter,
            media_extensions: lowercase_all(media_extensions),
            blocked_post_hints: lowercase_all(blocked_post_hints),
            base_url,
        })
    }

    /// Create an extractor from the service configuration and a source base URL
    pub fn from_config(config: &AffirmConfig, base_url: &str) -> Result<Self> {
        Self::new(
            ContentFilter::from_config(config),
            &config.media_extensions,
            &config.blocked_post_hints,
            base_url,
        )
    }

    /// Extract a servable item, or `None` if the record is not a candidate
    pub fn extract(&self, raw: &RawItem, topic: &str) -> Option<AffirmationItem> {
        if self.is_media(raw) {
            return None;
        }

        let line = self.candidate_line(raw)?;

        Some(AffirmationItem {
            line,
            source_topic: topic.to_string(),
            permalink: self.resolve_permalink(&raw.permalink),
            popularity: raw.ups,
        })
    }

    /// Whether the record is image/video/gallery content
    pub fn is_media(&self, raw: &RawItem) -> bool {
        if raw.is_gallery || raw.is_video {
            return true;
        }

        let hint = raw.post_hint.to_lowercase();
        if !hint.is_empty() && self.blocked_post_hints.iter().any(|h| *h == hint) {
            return true;
        }

        let url = raw.primary_url().to_lowercase();
        self.media_extensions.iter().any(|ext| url.ends_with(ext.as_str()))
    }

    fn candidate_line(&self, raw: &RawItem) -> Option<String> {
        let title = raw.title.trim();
        if self.filter.is_acceptable(title) {
            return Some(title.to_string());
        }

        let first_line = raw.selftext.trim().split('\n').next().unwrap_or("").trim();
        if self.filter.is_acceptable(first_line) {
            return Some(first_line.to_string());
        }

        None
    }

    /// Resolve a relative permalink; falls back to the base URL itself
    pub fn resolve_permalink(&self, permalink: &str) -> String {
        self.base_url
            .join(permalink.trim())
            .unwrap_or_else(|_| self.base_url.clone())
            .to_string()
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}
