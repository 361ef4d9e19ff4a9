// # affirm-core
//
// Aggregation and cache-refresh engine for the affirmation service.
//
// ## Architecture Overview
//
// - **FeedSource**: Trait for fetching one topic's top items from a feed
// - **ContentFilter**: Length and denylist checks on candidate lines
// - **LineExtractor**: Raw record → candidate line (title, else first body line)
// - **Aggregator**: Concurrent per-topic fan-out with failure isolation
// - **dedupe**: Case-insensitive merge keeping the most popular variant
// - **CacheStore**: Single-flight, never-empty snapshot holder
// - **AffirmationService**: Random pick and health surface for callers
//
// ## Design Principles
//
// 1. **Availability over freshness**: A failed refresh never empties the cache
// 2. **Failure isolation**: One bad topic costs only its own items
// 3. **Library-first**: The daemon is a thin layer over this crate

pub mod traits;
pub mod types;
pub mod config;
pub mod error;
pub mod filter;
pub mod extract;
pub mod aggregator;
pub mod dedupe;
pub mod cache;
pub mod service;

// Re-export core types for convenience
pub use traits::FeedSource;
pub use types::{AffirmationItem, Health, RawItem, Timeframe};
pub use config::{AffirmConfig, SourceConfig};
pub use error::{Error, Result};
pub use filter::ContentFilter;
pub use extract::LineExtractor;
pub use aggregator::{Aggregation, Aggregator};
pub use dedupe::dedupe;
pub use cache::{CacheSnapshot, CacheStore, RefreshOutcome};
pub use service::AffirmationService;
