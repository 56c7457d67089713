//! One sync cycle: fetch every feed, merge, swap, persist.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use roomcal_core::{FailurePolicy, FeedParse, MergeReport, Snapshot, SyncBatch};
use roomcal_providers::{FeedSource, fetch_occupancy};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::ServerResult;
use crate::store::SnapshotStore;

/// Snapshot shared between the sync engine and its readers.
pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

/// Creates a new shared snapshot.
pub fn new_shared_snapshot(snapshot: Snapshot) -> SharedSnapshot {
    Arc::new(RwLock::new(snapshot))
}

/// A resource and the source its feed comes from.
#[derive(Clone)]
pub struct FeedBinding {
    pub resource: String,
    pub source: Arc<dyn FeedSource>,
}

impl std::fmt::Debug for FeedBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedBinding")
            .field("resource", &self.resource)
            .field("kind", &self.source.kind())
            .field("locator", &self.source.locator())
            .finish()
    }
}

/// A resource whose retrieval failed during a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    pub resource: String,
    pub reason: String,
}

/// What one sync cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Resources whose feed was fetched and parsed.
    pub fetched: usize,
    /// Resources whose retrieval failed.
    pub failures: Vec<FeedFailure>,
    /// Structural anomalies reported by the transducer, across all feeds.
    pub warnings: usize,
    /// Blocked days across the whole snapshot after the merge.
    pub blocked_days: usize,
    /// How the merge treated each resource.
    pub report: MergeReport,
    /// Whether the snapshot was written to the store.
    pub persisted: bool,
    pub elapsed: Duration,
}

impl SyncSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when there were feeds to fetch and none of them could be fetched.
    pub fn all_failed(&self) -> bool {
        self.fetched == 0 && !self.failures.is_empty()
    }
}

/// Runs sync cycles for a fixed set of feeds.
pub struct SyncEngine {
    feeds: Vec<FeedBinding>,
    config: SyncConfig,
    snapshot: SharedSnapshot,
    store: Arc<dyn SnapshotStore>,
}

impl SyncEngine {
    /// Creates an engine with no feeds and an empty snapshot.
    pub fn new(store: Arc<dyn SnapshotStore>, config: SyncConfig) -> Self {
        Self {
            feeds: Vec::new(),
            config,
            snapshot: new_shared_snapshot(Snapshot::new()),
            store,
        }
    }

    /// Builder: add a feed for `resource`.
    pub fn with_feed(mut self, resource: impl Into<String>, source: Arc<dyn FeedSource>) -> Self {
        self.add_feed(resource, source);
        self
    }

    /// Adds a feed for `resource`, replacing any existing one.
    pub fn add_feed(&mut self, resource: impl Into<String>, source: Arc<dyn FeedSource>) {
        let resource = resource.into();
        self.feeds.retain(|feed| feed.resource != resource);
        self.feeds.push(FeedBinding { resource, source });
    }

    pub fn feeds(&self) -> &[FeedBinding] {
        &self.feeds
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.config.failure_policy
    }

    /// Returns the shared snapshot.
    pub fn snapshot(&self) -> SharedSnapshot {
        self.snapshot.clone()
    }

    /// Returns a copy of the current snapshot.
    pub async fn current(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Replaces the in-memory snapshot with the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn restore(&self) -> ServerResult<()> {
        let stored = self.store.load()?;
        info!(
            store = %self.store.describe(),
            resources = stored.len(),
            "Restored snapshot"
        );
        *self.snapshot.write().await = stored;
        Ok(())
    }

    /// Runs one sync cycle.
    ///
    /// All feeds are fetched concurrently and the merge waits until every
    /// retrieval has settled. The merge runs against the snapshot held under
    /// the write lock, so concurrent cycles cannot lose each other's updates.
    ///
    /// # Errors
    ///
    /// Feed failures are folded into the summary. Only a failed save is an
    /// error; the in-memory snapshot is already updated when that happens.
    /// The store is called on the blocking pool.
    #[instrument(skip(self), fields(feeds = self.feeds.len()))]
    pub async fn sync_once(&self) -> ServerResult<SyncSummary> {
        let started = Instant::now();

        let results = join_all(self.feeds.iter().map(|feed| self.fetch_one(feed))).await;

        let mut summary = SyncSummary::default();
        let mut batch = SyncBatch::new();
        for (resource, result) in results {
            match result {
                Ok(parse) => {
                    summary.fetched += 1;
                    summary.warnings += parse.warnings.len();
                    batch.fetched(resource, parse.occupancy);
                }
                Err(reason) => {
                    batch.failed(resource.clone(), reason.clone());
                    summary.failures.push(FeedFailure { resource, reason });
                }
            }
        }

        let mut current = self.snapshot.write().await;
        let (next, report) = current.apply(batch, self.config.failure_policy);
        *current = next;
        summary.blocked_days = current.blocked_count();
        summary.report = report;

        // Readers may proceed while the file is written; other writers wait
        // until the save returns, so saves land in merge order.
        let current = current.downgrade();
        if self.config.persist {
            let store = self.store.clone();
            let snapshot = Snapshot::clone(&current);
            tokio::task::spawn_blocking(move || store.save(&snapshot)).await??;
            summary.persisted = true;
        }
        drop(current);

        summary.elapsed = started.elapsed();
        info!(
            fetched = summary.fetched,
            failed = summary.failed(),
            warnings = summary.warnings,
            blocked_days = summary.blocked_days,
            cleared = summary.report.cleared.len(),
            preserved = summary.report.preserved.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Sync completed"
        );
        Ok(summary)
    }

    async fn fetch_one(&self, feed: &FeedBinding) -> (String, Result<FeedParse, String>) {
        let fetch = fetch_occupancy(feed.source.as_ref());
        let result = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(parse)) => {
                debug!(
                    resource = %feed.resource,
                    blocked = parse.occupancy.blocked_count(),
                    "Feed parsed"
                );
                Ok(parse)
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}s",
                self.config.fetch_timeout.as_secs()
            )),
        };

        if let Err(ref reason) = result {
            warn!(
                resource = %feed.resource,
                locator = %feed.source.locator(),
                reason = %reason,
                policy = self.config.failure_policy.as_str(),
                "Feed retrieval failed"
            );
        }
        (feed.resource.clone(), result)
    }
}
