//! Affirmation service
//!
//! The public surface consumed by a request-routing layer:
//!
//! - [`AffirmationService::random_affirmation`]: refresh if stale, then pick
//!   one item uniformly at random
//! - [`AffirmationService::health`]: item count and snapshot age, read-only
//!
//! ## Refresh Flow
//!
//! 1. A request finds the snapshot stale (or the daemon warms up)
//! 2. [`Aggregator`] fetches every topic concurrently
//! 3. [`dedupe`] collapses case-insensitive duplicates
//! 4. [`CacheStore`] swaps in the result, or keeps the old items if the
//!    result is empty
//!
//! ## Lifecycle
//!
//! 1. Create with [`AffirmationService::new()`]; the cache starts with the
//!    configured fallback lines and an epoch timestamp
//! 2. Share behind an `Arc` between request handlers
//! 3. The first request triggers the first real refresh

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::aggregator::Aggregator;
use crate::cache::{CacheSnapshot, CacheStore, RefreshOutcome};
use crate::config::AffirmConfig;
use crate::dedupe::dedupe;
use crate::error::{Error, Result};
use crate::traits::FeedSource;
use crate::types::{AffirmationItem, Health};

/// Topic recorded on items from the fallback seed
pub const FALLBACK_TOPIC: &str = "fallback";

/// Owns the aggregation pipeline and the serving cache
pub struct AffirmationService {
    aggregator: Aggregator,
    cache: CacheStore,
    topics: Vec<String>,
    ttl: Duration,
}

impl AffirmationService {
    /// Create a new service
    ///
    /// # Parameters
    ///
    /// - `source`: Feed source every topic is fetched from
    /// - `config`: Service configuration (validated here)
    pub fn new(source: Arc<dyn FeedSource>, config: AffirmConfig) -> Result<Self> {
        config.validate()?;

        let aggregator = Aggregator::from_config(source, &config)?;

        let home = aggregator.extractor().resolve_permalink("");
        let fallback = config
            .fallback_items
            .iter()
            .map(|line| AffirmationItem::new(line.trim(), FALLBACK_TOPIC, home.clone()))
            .collect();

        Ok(Self {
            aggregator,
            cache: CacheStore::with_fallback(fallback)?,
            ttl: config.cache_ttl(),
            topics: config.topics,
        })
    }

    /// Pick one item at random, refreshing the cache first if it is stale
    ///
    /// # Returns
    ///
    /// - `Ok(AffirmationItem)`: A uniformly random item from the snapshot
    /// - `Err(Error::Unavailable)`: The snapshot is empty
    pub async fn random_affirmation(&self) -> Result<AffirmationItem> {
        self.refresh_if_stale().await;

        let snapshot = self.cache.snapshot().await;
        snapshot
            .items
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(Error::Unavailable)
    }

    /// Item count and snapshot age; never triggers a refresh
    pub async fn health(&self) -> Health {
        let snapshot = self.cache.snapshot().await;
        let age = snapshot.age(Utc::now());

        Health {
            item_count: snapshot.items.len(),
            age_seconds: age.num_milliseconds() as f64 / 1000.0,
        }
    }

    /// Refresh the cache if its TTL has run out
    pub async fn refresh_if_stale(&self) -> RefreshOutcome {
        self.cache
            .refresh_if_stale(self.ttl, || self.run_cycle())
            .await
    }

    /// Refresh the cache now, regardless of its age
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.cache.force_refresh(|| self.run_cycle()).await
    }

    /// The last committed snapshot
    pub async fn snapshot(&self) -> Arc<CacheSnapshot> {
        self.cache.snapshot().await
    }

    /// Topics polled on every refresh
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    async fn run_cycle(&self) -> Vec<AffirmationItem> {
        let merged = self.aggregator.refresh_all(&self.topics).await;
        let merged_count = merged.len();
        let unique = dedupe(merged);

        debug!(
            "Refresh cycle: {} merged item(s), {} unique",
            merged_count,
            unique.len()
        );

        unique
    }
}
