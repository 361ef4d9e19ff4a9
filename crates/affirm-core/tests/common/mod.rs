//! Test doubles and common utilities for contract tests
//!
//! This module provides scripted feed sources whose per-topic behavior is
//! chosen by the test, plus call counters to observe fetch traffic.

#![allow(dead_code)]

use affirm_core::error::{Error, Result};
use affirm_core::{AffirmConfig, FeedSource, RawItem, Timeframe};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a scripted topic does when fetched
#[derive(Debug, Clone)]
pub enum TopicBehavior {
    /// Return these records
    Items(Vec<RawItem>),
    /// Return these records after a delay
    Delayed(Duration, Vec<RawItem>),
    /// Fail immediately
    Fail,
    /// Never answer (until the test's timeout bounds it)
    Hang,
}

/// A FeedSource whose per-topic responses are scripted
pub struct ScriptedSource {
    behaviors: std::sync::Mutex<HashMap<String, TopicBehavior>>,
    /// Call counter for fetch(), across all topics
    fetch_call_count: Arc<AtomicUsize>,
    /// Topics fetched, in call order
    fetched_topics: Arc<std::sync::Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            behaviors: std::sync::Mutex::new(HashMap::new()),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
            fetched_topics: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Script a topic
    pub fn with_topic(self, topic: &str, behavior: TopicBehavior) -> Self {
        self.set_topic(topic, behavior);
        self
    }

    /// Re-script a topic after construction
    pub fn set_topic(&self, topic: &str, behavior: TopicBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(topic.to_string(), behavior);
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Get the topics that were fetched
    pub fn fetched_topics(&self) -> Vec<String> {
        self.fetched_topics.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, topic: &str, _limit: usize, _timeframe: Timeframe) -> Result<Vec<RawItem>> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        self.fetched_topics.lock().unwrap().push(topic.to_string());

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(topic)
            .cloned()
            .unwrap_or(TopicBehavior::Fail);

        match behavior {
            TopicBehavior::Items(items) => Ok(items),
            TopicBehavior::Delayed(delay, items) => {
                tokio::time::sleep(delay).await;
                Ok(items)
            }
            TopicBehavior::Fail => Err(Error::source_unavailable(topic, "scripted failure")),
            TopicBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }

    fn base_url(&self) -> &str {
        "https://feeds.example"
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A text post with a title and score
pub fn post(title: &str, ups: u64) -> RawItem {
    RawItem {
        title: title.to_string(),
        permalink: format!("/r/test/comments/{}/", title.len()),
        url: "https://feeds.example/r/test/".to_string(),
        ups,
        ..Default::default()
    }
}

/// Helper to create a minimal AffirmConfig for testing
///
/// Uses a one-second fetch timeout so hanging topics settle quickly.
pub fn minimal_config(topics: &[&str]) -> AffirmConfig {
    let mut config = AffirmConfig {
        topics: topics.iter().map(|t| t.to_string()).collect(),
        fallback_items: vec!["Fallback: you are still great.".to_string()],
        ..Default::default()
    };
    config.source.timeout_secs = 1;
    config
}
