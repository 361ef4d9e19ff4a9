// # Feed Source Trait
//
// Defines the interface for fetching one topic's top items from a remote feed.
//
// ## Implementations
//
// - Reddit listing JSON: `affirm-source-reddit` crate
//
// ## Usage
//
// ```rust,ignore
// use affirm_core::{FeedSource, Timeframe};
//
// #[tokio::main]
// async fn main() -> affirm_core::Result<()> {
//     let source = /* FeedSource implementation */;
//
//     let items = source.fetch("dadjokes", 100, Timeframe::Month).await?;
//     println!("fetched {} raw items", items.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::types::{RawItem, Timeframe};

/// Trait for feed source implementations
///
/// A source is a thin transport: one request per call, no filtering, no
/// retries and no caching. Retrying is the refresh cycle's job; each cycle
/// is itself the retry.
///
/// Implementations must be thread-safe, since the aggregator calls `fetch`
/// for every topic concurrently on the same instance.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the top items for one topic
    ///
    /// # Parameters
    ///
    /// - `topic`: Feed identifier (e.g. a subreddit name)
    /// - `limit`: Maximum number of items to request
    /// - `timeframe`: Window the ranking is computed over
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<RawItem>)`: Records exactly as the feed provided them
    /// - `Err(Error::SourceUnavailable)`: Transport error, non-2xx status or
    ///   malformed payload
    async fn fetch(
        &self,
        topic: &str,
        limit: usize,
        timeframe: Timeframe,
    ) -> Result<Vec<RawItem>, crate::Error>;

    /// Base URL that relative permalinks from this source resolve against
    fn base_url(&self) -> &str;

    /// Short name used in logs
    fn source_name(&self) -> &'static str;
}
