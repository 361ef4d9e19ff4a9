//! Core traits for the affirmation service
//!
//! - [`FeedSource`]: Fetch raw items for one topic from a remote feed

pub mod feed_source;

pub use feed_source::FeedSource;
