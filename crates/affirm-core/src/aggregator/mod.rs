//! Multi-topic aggregator
//!
//! Fans one [`FeedSource::fetch`] out per topic, waits for every topic to
//! settle, and merges whatever survived extraction.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌─────────────┐
//!                  │ Aggregator  │
//!                  └─────────────┘
//!                         │ JoinSet (one task per topic)
//!         ┌───────────────┼───────────────┐
//!         ▼               ▼               ▼
//!   ┌───────────┐   ┌───────────┐   ┌───────────┐
//!   │ fetch(A)  │   │ fetch(B)  │   │ fetch(C)  │   each under its own timeout
//!   └───────────┘   └───────────┘   └───────────┘
//!         │               │               │
//!         ▼               ▼               ▼
//!   LineExtractor   LineExtractor   LineExtractor
//!         │               │               │
//!         └───────────────┼───────────────┘
//!                         ▼
//!                   merged items
//! ```
//!
//! ## Failure Isolation
//!
//! A failing, hanging or panicking topic contributes zero items. It never
//! aborts or delays the others beyond its own timeout, and it is never
//! reported to the caller as an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::AffirmConfig;
use crate::error::{Error, Result};
use crate::extract::LineExtractor;
use crate::traits::FeedSource;
use crate::types::{AffirmationItem, Timeframe};

/// Result of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Items from every topic that succeeded, in completion order
    pub items: Vec<AffirmationItem>,

    /// Topics that succeeded
    pub succeeded: Vec<String>,

    /// Topics that failed, timed out or panicked
    pub failed: Vec<String>,
}

/// Concurrent fan-out over all configured topics
pub struct Aggregator {
    source: Arc<dyn FeedSource>,
    extractor: Arc<LineExtractor>,
    per_topic_limit: usize,
    timeframe: Timeframe,

    /// Upper bound on a single topic's fetch
    fetch_timeout: Duration,
}

impl Aggregator {
    /// Create a new aggregator
    pub fn new(
        source: Arc<dyn FeedSource>,
        extractor: LineExtractor,
        per_topic_limit: usize,
        timeframe: Timeframe,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            extractor: Arc::new(extractor),
            per_topic_limit,
            timeframe,
            fetch_timeout,
        }
    }

    /// Create an aggregator from the service configuration
    pub fn from_config(source: Arc<dyn FeedSource>, config: &AffirmConfig) -> Result<Self> {
        let extractor = LineExtractor::from_config(config, source.base_url())?;

        Ok(Self::new(
            source,
            extractor,
            config.per_topic_limit,
            config.timeframe,
            config.source.timeout(),
        ))
    }

    /// The extractor applied to every raw item
    pub fn extractor(&self) -> &LineExtractor {
        &self.extractor
    }

    /// Fetch every topic and return the merged items
    pub async fn refresh_all(&self, topics: &[String]) -> Vec<AffirmationItem> {
        self.collect(topics).await.items
    }

    /// Fetch every topic, reporting which ones succeeded
    ///
    /// Duplicate topic identifiers are fetched once. The returned items are
    /// not deduplicated.
    pub async fn collect(&self, topics: &[String]) -> Aggregation {
        let mut tasks = JoinSet::new();
        let mut task_topics = HashMap::new();
        let mut seen = HashSet::new();

        for topic in topics {
            if !seen.insert(topic.as_str()) {
                continue;
            }

            let source = Arc::clone(&self.source);
            let extractor = Arc::clone(&self.extractor);
            let topic = topic.clone();
            let limit = self.per_topic_limit;
            let timeframe = self.timeframe;
            let timeout = self.fetch_timeout;

            let handle = tasks.spawn({
                let topic = topic.clone();
                async move {
                    fetch_topic(source.as_ref(), &extractor, &topic, limit, timeframe, timeout)
                        .await
                }
            });
            task_topics.insert(handle.id(), topic);
        }

        let mut aggregation = Aggregation::default();

        // Barrier: every topic settles before the merge is returned
        while let Some(joined) = tasks.join_next_with_id().await {
            let id = match &joined {
                Ok((id, _)) => *id,
                Err(e) => e.id(),
            };
            let topic = task_topics.remove(&id).unwrap_or_default();

            // A panicked task surfaces as a JoinError
            let outcome = joined.map(|(_, result)| result).unwrap_or_else(|e| {
                Err(Error::source_unavailable(
                    topic.as_str(),
                    format!("fetch task aborted: {}", e),
                ))
            });

            match outcome {
                Ok(items) => {
                    aggregation.items.extend(items);
                    aggregation.succeeded.push(topic);
                }
                Err(e) => {
                    warn!("Topic {} contributed no items: {}", topic, e);
                    aggregation.failed.push(topic);
                }
            }
        }

        info!(
            "Aggregated {} item(s) from {} topic(s) ({} failed) via {}",
            aggregation.items.len(),
            aggregation.succeeded.len(),
            aggregation.failed.len(),
            self.source.source_name()
        );

        aggregation
    }
}

/// Fetch and extract a single topic
async fn fetch_topic(
    source: &dyn FeedSource,
    extractor: &LineExtractor,
    topic: &str,
    limit: usize,
    timeframe: Timeframe,
    timeout: Duration,
) -> Result<Vec<AffirmationItem>> {
    let raw = tokio::time::timeout(timeout, source.fetch(topic, limit, timeframe))
        .await
        .map_err(|_| Error::source_unavailable(topic, format!("timed out after {:?}", timeout)))??;

    let fetched = raw.len();
    let items: Vec<AffirmationItem> = raw
        .iter()
        .filter_map(|item| extractor.extract(item, topic))
        .collect();

    debug!(
        "Topic {}: kept {} of {} fetched item(s)",
        topic,
        items.len(),
        fetched
    );

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawItem;
    use async_trait::async_trait;

    struct PanickingSource;

    #[async_trait]
    impl FeedSource for PanickingSource {
        async fn fetch(&self, topic: &str, _limit: usize, _timeframe: Timeframe) -> Result<Vec<RawItem>> {
            if topic == "boom" {
                panic!("source bug");
            }
            Ok(vec![RawItem {
                title: format!("line from {}", topic),
                ..Default::default()
            }])
        }

        fn base_url(&self) -> &str {
            "https://feeds.example"
        }

        fn source_name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_panicking_topic_is_isolated() {
        let aggregator =
            Aggregator::from_config(Arc::new(PanickingSource), &AffirmConfig::default()).unwrap();

        let topics = vec!["ok".to_string(), "boom".to_string()];
        let aggregation = aggregator.collect(&topics).await;

        assert_eq!(aggregation.items.len(), 1);
        assert_eq!(aggregation.items[0].line, "line from ok");
        assert_eq!(aggregation.succeeded, vec!["ok".to_string()]);
        assert_eq!(aggregation.failed, vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_topics_fetched_once() {
        let aggregator =
            Aggregator::from_config(Arc::new(PanickingSource), &AffirmConfig::default()).unwrap();

        let topics = vec!["a".to_string(), "a".to_string()];
        let items = aggregator.refresh_all(&topics).await;

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_no_topics_yields_nothing() {
        let aggregator =
            Aggregator::from_config(Arc::new(PanickingSource), &AffirmConfig::default()).unwrap();

        assert!(aggregator.refresh_all(&[]).await.is_empty());
    }
}
