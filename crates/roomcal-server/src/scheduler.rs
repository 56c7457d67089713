//! Background scheduler for feed sync.
//!
//! This module provides a scheduler that periodically runs a sync function
//! with support for:
//! - A fixed sync interval (60 seconds by default)
//! - Optional jitter when several instances poll the same hosts
//! - Exponential backoff on errors
//!
//! Each sync is awaited before the next one is scheduled, so syncs driven by
//! one scheduler never overlap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base interval between syncs.
    pub sync_interval: Duration,
    /// Maximum jitter to add to sync interval (as fraction 0.0-1.0).
    pub jitter_fraction: f64,
    /// Initial backoff duration on error.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(Self::DEFAULT_INTERVAL_SECS),
            jitter_fraction: 0.0,
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }
}

impl SchedulerConfig {
    pub const DEFAULT_INTERVAL_SECS: u64 = 60;

    /// Creates a new scheduler config with the given sync interval.
    pub fn new(sync_interval: Duration) -> Self {
        Self {
            sync_interval,
            ..Default::default()
        }
    }

    /// Builder: set jitter fraction.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Builder: set backoff parameters.
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the next sync delay with jitter.
    pub fn next_sync_delay(&self) -> Duration {
        let base = self.sync_interval.as_secs_f64();
        if self.jitter_fraction == 0.0 {
            return self.sync_interval;
        }
        let jitter = rand_jitter(base * self.jitter_fraction);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }

    /// Calculates backoff delay based on consecutive failures.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_secs_f64();
        let multiplier = self
            .backoff_multiplier
            .powi(consecutive_failures.saturating_sub(1).min(i32::MAX as u32) as i32);
        let delay = base * multiplier;
        let max = self.max_backoff.as_secs_f64();

        Duration::from_secs_f64(delay.min(max))
    }
}

/// Pseudo-random value in [-range, range] taken from the clock.
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let fraction = (nanos as f64) / 1_000_000_000.0;
    (fraction * 2.0 - 1.0) * range
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Trigger an immediate sync.
    SyncNow,
    /// Stop the scheduler.
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of syncs attempted.
    pub attempts: u64,
    /// Number of consecutive sync failures.
    pub consecutive_failures: u32,
    /// Last successful sync time.
    pub last_sync: Option<DateTime<Utc>>,
    /// Last sync attempt time.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Last error message.
    pub last_error: Option<String>,
}

impl SchedulerState {
    /// Creates a new scheduler state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful sync.
    pub fn record_success(&mut self) {
        self.attempts += 1;
        self.consecutive_failures = 0;
        self.last_sync = Some(Utc::now());
        self.last_attempt = self.last_sync;
        self.last_error = None;
    }

    /// Records a failed sync.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.attempts += 1;
        self.consecutive_failures += 1;
        self.last_attempt = Some(Utc::now());
        self.last_error = Some(error.into());
    }

    /// Returns the time since last successful sync.
    pub fn time_since_sync(&self) -> Option<Duration> {
        self.last_sync.map(|last| {
            let elapsed = Utc::now() - last;
            Duration::from_secs(elapsed.num_seconds().max(0) as u64)
        })
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Creates a new shared scheduler state.
pub fn new_scheduler_state() -> SharedSchedulerState {
    Arc::new(RwLock::new(SchedulerState::new()))
}

/// The scheduler manages periodic background syncs.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Creates a new scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: new_scheduler_state(),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the scheduler loop with the given sync function.
    ///
    /// The sync function runs once immediately and then after every delay.
    /// It should return `Ok(())` on success or an error message on failure.
    /// The loop ends on `Stop` or when every handle has been dropped.
    pub async fn run<F, Fut>(self, sync_fn: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send,
    {
        let Self {
            config,
            state,
            command_tx,
            mut command_rx,
        } = self;
        // Only external handles keep the loop alive.
        drop(command_tx);

        info!(
            interval_secs = config.sync_interval.as_secs(),
            "Scheduler started"
        );

        do_sync(&state, &sync_fn).await;

        loop {
            let delay = next_delay(&config, &state).await;
            debug!(delay_secs = delay.as_secs(), "Scheduling next sync");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    do_sync(&state, &sync_fn).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::SyncNow) => {
                            debug!("Received SyncNow command");
                            do_sync(&state, &sync_fn).await;
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Backoff delay after failures, capped at the regular interval.
async fn next_delay(config: &SchedulerConfig, state: &SharedSchedulerState) -> Duration {
    let failures = state.read().await.consecutive_failures;
    if failures > 0 {
        let backoff = config.backoff_delay(failures).min(config.next_sync_delay());
        debug!(
            failures,
            backoff_secs = backoff.as_secs(),
            "Using backoff delay"
        );
        return backoff;
    }
    config.next_sync_delay()
}

async fn do_sync<F, Fut>(state: &SharedSchedulerState, sync_fn: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    debug!("Starting sync");
    match sync_fn().await {
        Ok(()) => {
            state.write().await.record_success();
        }
        Err(e) => {
            warn!(error = %e, "Sync failed");
            state.write().await.record_failure(e);
        }
    }
}

/// Handle for sending commands to a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Triggers an immediate sync.
    pub async fn sync_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::SyncNow).await
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.sync_interval, Duration::from_secs(60));
        assert_eq!(config.next_sync_delay(), Duration::from_secs(60));
    }

    #[test]
    fn config_next_sync_delay() {
        let config = SchedulerConfig::new(Duration::from_secs(60)).with_jitter(0.1);

        let delay = config.next_sync_delay();
        assert!(delay.as_secs_f64() >= 54.0);
        assert!(delay.as_secs_f64() <= 66.0);
    }

    #[test]
    fn config_backoff_delay() {
        let config = SchedulerConfig::default().with_backoff(
            Duration::from_secs(5),
            Duration::from_secs(300),
            2.0,
        );

        assert_eq!(config.backoff_delay(0), Duration::ZERO);
        assert_eq!(config.backoff_delay(1), Duration::from_secs(5));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(10));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(20));
        assert_eq!(config.backoff_delay(10), Duration::from_secs(300));
    }

    #[test]
    fn state_records() {
        let mut state = SchedulerState::new();

        state.record_failure("relay returned 502");
        assert_eq!(state.consecutive_failures, 1);
        assert!(state.last_attempt.is_some());
        assert!(state.last_sync.is_none());
        assert_eq!(state.last_error.as_deref(), Some("relay returned 502"));

        state.record_success();
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.attempts, 2);
        assert!(state.last_error.is_none());
        assert!(state.time_since_sync().is_some());
    }

    fn counting(count: Arc<AtomicU32>) -> impl Fn() -> std::future::Ready<Result<(), String>> {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_at_start_and_every_interval() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone())));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn sync_now_and_stop() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(3600)));
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone())));
        tokio::time::sleep(Duration::from_millis(10)).await;

        handle.sync_now().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(handle.state().await.attempts, 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
        assert!(handle.sync_now().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_stops_the_loop() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let handle = scheduler.handle();
        let count = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(scheduler.run(counting(count.clone())));
        drop(handle);
        task.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_then_recovers() {
        let config = SchedulerConfig::new(Duration::from_secs(60)).with_backoff(
            Duration::from_secs(1),
            Duration::from_secs(30),
            2.0,
        );
        let scheduler = Scheduler::new(config);
        let state = scheduler.state();
        let handle = scheduler.handle();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let task = tokio::spawn(scheduler.run(move || {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < 3 {
                Err(format!("Failure {}", n))
            } else {
                Ok(())
            })
        }));

        // Failures at t=0, 1, 3 then success at t=7.
        tokio::time::sleep(Duration::from_millis(7500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let snapshot = state.read().await.clone();
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.attempts, 4);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }
}
