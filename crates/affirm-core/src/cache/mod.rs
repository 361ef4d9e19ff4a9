// # Cache Store
//
// Holds the single serving snapshot and decides when it is refreshed.
//
// ## Guarantees
//
// - Readers always get a whole snapshot: the current `Arc<CacheSnapshot>`
//   is swapped under a write lock, never edited in place
// - At most one refresh runs at a time (single-flight gate)
// - A refresh that yields nothing keeps the previous items and only
//   advances the timestamp, so a caller is never handed an empty set
//   because of failing sources
//
// ## Crash Behavior
//
// - Nothing is persisted; a restart serves the fallback seed until the
//   first refresh succeeds

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::AffirmationItem;

/// Immutable serving set plus its refresh time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheSnapshot {
    /// Unique items, in dedupe output order
    pub items: Vec<AffirmationItem>,

    /// Last refresh attempt; the Unix epoch if none happened yet
    pub refreshed_at: DateTime<Utc>,
}

impl CacheSnapshot {
    /// Create a snapshot that has never been refreshed
    ///
    /// Its timestamp is the Unix epoch, so it is stale under any TTL.
    pub fn seed(items: Vec<AffirmationItem>) -> Self {
        Self {
            items,
            refreshed_at: DateTime::<Utc>::default(),
        }
    }

    /// Time since the last refresh attempt, as of `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.refreshed_at)
    }

    /// Whether the snapshot is older than `ttl` or has nothing to serve
    ///
    /// A timestamp in the future (clock moved backwards) counts as fresh.
    pub fn needs_refresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        if self.items.is_empty() {
            return true;
        }

        match self.age(now).to_std() {
            Ok(elapsed) => elapsed >= ttl,
            Err(_) => false,
        }
    }
}

/// What a refresh call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot was within its TTL; nothing was fetched
    Fresh,

    /// New items were committed
    Refreshed {
        /// Number of items now served
        items: usize,
    },

    /// The refresh produced nothing; the previous items were kept and the
    /// timestamp advanced
    EmptyRefresh {
        /// Number of items still served
        kept: usize,
    },
}

/// Process-wide holder of the serving snapshot
///
/// # Example
///
/// ```rust,no_run
/// use affirm_core::cache::CacheStore;
/// use affirm_core::AffirmationItem;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = CacheStore::with_fallback(vec![
///         AffirmationItem::new("You are doing great.", "fallback", "https://example.com/"),
///     ])?;
///
///     store
///         .refresh_if_stale(Duration::from_secs(3600), || async { Vec::new() })
///         .await;
///
///     assert_eq!(store.snapshot().await.items.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct CacheStore {
    current: RwLock<Arc<CacheSnapshot>>,

    /// Held for the whole decide-stale → fetch → commit sequence
    refresh_gate: Mutex<()>,
}

impl CacheStore {
    /// Create a store serving `initial`
    pub fn new(initial: CacheSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Create a store seeded with a never-refreshed fallback set
    pub fn with_fallback(items: Vec<AffirmationItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::config("Fallback set cannot be empty"));
        }
        Ok(Self::new(CacheSnapshot::seed(items)))
    }

    /// The last committed snapshot
    pub async fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Run `refresh` once if the snapshot is stale or empty
    ///
    /// Concurrent callers queue on the gate and re-check staleness once they
    /// hold it, so they see the snapshot the first caller committed instead
    /// of fetching again.
    pub async fn refresh_if_stale<F, Fut>(&self, ttl: Duration, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<AffirmationItem>>,
    {
        if !self.snapshot().await.needs_refresh(ttl, Utc::now()) {
            return RefreshOutcome::Fresh;
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have committed while we waited
        if !self.snapshot().await.needs_refresh(ttl, Utc::now()) {
            debug!("Snapshot refreshed by a concurrent caller, skipping");
            return RefreshOutcome::Fresh;
        }

        let items = refresh().await;
        self.commit(items).await
    }

    /// Run `refresh` once regardless of the snapshot's age
    pub async fn force_refresh<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<AffirmationItem>>,
    {
        let _gate = self.refresh_gate.lock().await;
        let items = refresh().await;
        self.commit(items).await
    }

    async fn commit(&self, items: Vec<AffirmationItem>) -> RefreshOutcome {
        let now = Utc::now();
        let mut current = self.current.write().await;

        if items.is_empty() {
            let kept = current.items.clone();
            warn!(
                "Refresh produced no items, keeping {} previous item(s)",
                kept.len()
            );
            let count = kept.len();
            *current = Arc::new(CacheSnapshot {
                items: kept,
                refreshed_at: now,
            });
            return RefreshOutcome::EmptyRefresh { kept: count };
        }

        let count = items.len();
        info!("Cache refreshed with {} item(s)", count);
        *current = Arc::new(CacheSnapshot {
            items,
            refreshed_at: now,
        });
        RefreshOutcome::Refreshed { items: count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(line: &str) -> AffirmationItem {
        AffirmationItem::new(line, "t", "https://example.com/")
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_seed_is_stale() {
        let snapshot = CacheSnapshot::seed(vec![item("a")]);
        assert!(snapshot.needs_refresh(HOUR, Utc::now()));
        assert_eq!(snapshot.refreshed_at.timestamp(), 0);
    }

    #[test]
    fn test_fresh_snapshot_with_items() {
        let now = Utc::now();
        let snapshot = CacheSnapshot {
            items: vec![item("a")],
            refreshed_at: now,
        };
        assert!(!snapshot.needs_refresh(HOUR, now));
        assert!(snapshot.needs_refresh(HOUR, now + chrono::Duration::hours(1)));
        assert!(snapshot.needs_refresh(Duration::ZERO, now));
    }

    #[test]
    fn test_empty_snapshot_always_needs_refresh() {
        let now = Utc::now();
        let snapshot = CacheSnapshot {
            items: Vec::new(),
            refreshed_at: now,
        };
        assert!(snapshot.needs_refresh(HOUR, now));
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let now = Utc::now();
        let snapshot = CacheSnapshot {
            items: vec![item("a")],
            refreshed_at: now + chrono::Duration::minutes(5),
        };
        assert!(!snapshot.needs_refresh(HOUR, now));
    }

    #[test]
    fn test_empty_fallback_rejected() {
        tokio_test::assert_err!(CacheStore::with_fallback(Vec::new()));
        tokio_test::assert_ok!(CacheStore::with_fallback(vec![item("seed")]));
    }

    #[tokio::test]
    async fn test_refresh_replaces_wholesale() {
        let store = CacheStore::with_fallback(vec![item("seed")]).unwrap();

        let outcome = store
            .refresh_if_stale(HOUR, || async { vec![item("new1"), item("new2")] })
            .await;

        assert_eq!(outcome, RefreshOutcome::Refreshed { items: 2 });
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.items, vec![item("new1"), item("new2")]);
        assert!(snapshot.refreshed_at.timestamp() > 0);
    }

    #[tokio::test]
    async fn test_empty_refresh_keeps_items_and_advances_timestamp() {
        let store = CacheStore::with_fallback(vec![item("seed")]).unwrap();
        let before = store.snapshot().await;

        let outcome = store.refresh_if_stale(HOUR, || async { Vec::new() }).await;

        assert_eq!(outcome, RefreshOutcome::EmptyRefresh { kept: 1 });
        let after = store.snapshot().await;
        assert_eq!(after.items, before.items);
        assert!(after.refreshed_at > before.refreshed_at);

        // The advanced timestamp suppresses refetching within the TTL
        let calls = AtomicUsize::new(0);
        let outcome = store
            .refresh_if_stale(HOUR, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Vec::new()
            })
            .await;
        assert_eq!(outcome, RefreshOutcome::Fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_ttl() {
        let store = CacheStore::new(CacheSnapshot {
            items: vec![item("current")],
            refreshed_at: Utc::now(),
        });

        let outcome = store.force_refresh(|| async { vec![item("forced")] }).await;
        assert_eq!(outcome, RefreshOutcome::Refreshed { items: 1 });
        assert_eq!(store.snapshot().await.items[0].line, "forced");
    }

    #[tokio::test]
    async fn test_old_snapshot_survives_swap() {
        let store = CacheStore::with_fallback(vec![item("seed")]).unwrap();
        let held = store.snapshot().await;

        store.force_refresh(|| async { vec![item("next")] }).await;

        assert_eq!(held.items[0].line, "seed");
        assert_eq!(store.snapshot().await.items[0].line, "next");
    }
}
