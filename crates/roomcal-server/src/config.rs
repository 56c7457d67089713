//! Sync engine configuration.

use std::time::Duration;

use roomcal_core::FailurePolicy;

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// What a failed retrieval does to the resource's stored map.
    pub failure_policy: FailurePolicy,

    /// Upper bound on one source's retrieval, on top of any timeout the
    /// source applies itself.
    pub fetch_timeout: Duration,

    /// Whether to write the snapshot to the store after each sync.
    pub persist: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            fetch_timeout: Duration::from_secs(Self::DEFAULT_FETCH_TIMEOUT_SECS),
            persist: true,
        }
    }
}

impl SyncConfig {
    pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

    /// Creates a new sync configuration with the given failure policy.
    pub fn new(failure_policy: FailurePolicy) -> Self {
        Self {
            failure_policy,
            ..Default::default()
        }
    }

    /// Builder: set fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder: set whether snapshots are persisted.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }
}
