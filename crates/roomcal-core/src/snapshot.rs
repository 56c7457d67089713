//! Multi-resource availability snapshots and the sync merge policy.
//!
//! A [`Snapshot`] maps every resource that was ever synced to its
//! [`OccupancyMap`]. A sync produces a [`SyncBatch`] with one
//! [`FeedOutcome`] per resource, and [`Snapshot::apply`] turns the old
//! snapshot plus the batch into the next snapshot.
//!
//! Every resource in the batch is replaced in full; nothing is merged day by
//! day. That is what lets a cancelled booking disappear: a purely additive
//! merge could never un-block a day.

use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::occupancy::{DayStatus, OccupancyMap};

/// What to do with a resource whose feed could not be retrieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Replace the resource with an empty map, clearing every blocked day.
    ///
    /// An outage then looks exactly like a resource with no bookings until
    /// the next successful sync.
    #[default]
    Clear,
    /// Keep the resource's previous map.
    Preserve,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Preserve => "preserve",
        }
    }
}

/// Result of retrieving and parsing one resource's feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Feed fetched and parsed.
    Fetched(OccupancyMap),
    /// Retrieval failed.
    Failed { reason: String },
}

impl FeedOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// The outcomes of one round of retrievals, keyed by resource id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncBatch {
    outcomes: BTreeMap<String, FeedOutcome>,
}

impl SyncBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, replacing any earlier one for the same resource.
    pub fn insert(&mut self, resource: impl Into<String>, outcome: FeedOutcome) {
        self.outcomes.insert(resource.into(), outcome);
    }

    /// Records a successfully parsed feed.
    pub fn fetched(&mut self, resource: impl Into<String>, occupancy: OccupancyMap) {
        self.insert(resource, FeedOutcome::Fetched(occupancy));
    }

    /// Records a failed retrieval.
    pub fn failed(&mut self, resource: impl Into<String>, reason: impl Into<String>) {
        self.insert(
            resource,
            FeedOutcome::Failed {
                reason: reason.into(),
            },
        );
    }

    pub fn get(&self, resource: &str) -> Option<&FeedOutcome> {
        self.outcomes.get(resource)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of failed retrievals in the batch.
    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failed()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeedOutcome)> {
        self.outcomes.iter().map(|(id, outcome)| (id.as_str(), outcome))
    }
}

impl<K: Into<String>> FromIterator<(K, FeedOutcome)> for SyncBatch {
    fn from_iter<I: IntoIterator<Item = (K, FeedOutcome)>>(iter: I) -> Self {
        let mut batch = Self::new();
        for (resource, outcome) in iter {
            batch.insert(resource, outcome);
        }
        batch
    }
}

impl IntoIterator for SyncBatch {
    type Item = (String, FeedOutcome);
    type IntoIter = btree_map::IntoIter<String, FeedOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

/// Which resources a merge touched, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Replaced by a freshly fetched map.
    pub replaced: Vec<String>,
    /// Failed and cleared to an empty map.
    pub cleared: Vec<String>,
    /// Failed and left as they were.
    pub preserved: Vec<String>,
}

/// Availability of every tracked resource.
///
/// Serializes as a nested object, `{"dept-1": {"2024-06-10": "BLOCKED"}}`,
/// with resources and days in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    resources: BTreeMap<String, OccupancyMap>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the occupancy of a resource, if it was ever synced.
    pub fn occupancy(&self, resource: &str) -> Option<&OccupancyMap> {
        self.resources.get(resource)
    }

    /// Returns the status of a resource on a day.
    ///
    /// Unknown resources and days without an entry are free.
    pub fn status(&self, resource: &str, date: NaiveDate) -> DayStatus {
        self.occupancy(resource)
            .map(|map| map.status(date))
            .unwrap_or_default()
    }

    /// Returns true if the resource has an entry.
    pub fn contains(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    /// Iterates over resource ids in sorted order.
    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Iterates over resources and their occupancy.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OccupancyMap)> {
        self.resources.iter().map(|(id, map)| (id.as_str(), map))
    }

    /// Number of tracked resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Total blocked days across all resources.
    pub fn blocked_count(&self) -> usize {
        self.resources.values().map(OccupancyMap::blocked_count).sum()
    }

    /// Applies a sync batch and returns the next snapshot.
    ///
    /// Every resource in the batch is replaced in full; resources outside the
    /// batch are carried over untouched. Failed resources follow `policy`,
    /// and still get an (empty) entry if they had none. `self` is not
    /// modified, so callers can swap the result in as one step.
    pub fn apply(&self, batch: SyncBatch, policy: FailurePolicy) -> (Snapshot, MergeReport) {
        let mut next = self.clone();
        let mut report = MergeReport::default();

        for (resource, outcome) in batch {
            match (outcome, policy) {
                (FeedOutcome::Fetched(occupancy), _) => {
                    next.resources.insert(resource.clone(), occupancy);
                    report.replaced.push(resource);
                }
                (FeedOutcome::Failed { .. }, FailurePolicy::Clear) => {
                    next.resources.insert(resource.clone(), OccupancyMap::new());
                    report.cleared.push(resource);
                }
                (FeedOutcome::Failed { .. }, FailurePolicy::Preserve) => {
                    next.resources.entry(resource.clone()).or_default();
                    report.preserved.push(resource);
                }
            }
        }

        (next, report)
    }

    /// Replaces each given resource with its fresh map.
    pub fn merge<K, I>(&self, maps: I) -> Snapshot
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, OccupancyMap)>,
    {
        let batch: SyncBatch = maps
            .into_iter()
            .map(|(resource, map)| (resource, FeedOutcome::Fetched(map)))
            .collect();
        self.apply(batch, FailurePolicy::default()).0
    }
}
