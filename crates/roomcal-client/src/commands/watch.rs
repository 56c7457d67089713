//! Watch command: sync periodically in the foreground.
//!
//! Runs until Ctrl-C, then stops the scheduler and lets any sync in
//! progress finish.

use std::sync::Arc;
use std::time::Duration;

use roomcal_server::Scheduler;
use tracing::{info, warn};

use crate::commands::sync::build_engine;
use crate::config::RoomcalConfig;
use crate::error::{ClientError, ClientResult};

/// Time allowed for the last sync to finish after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub async fn run(config: &RoomcalConfig, interval: Option<u64>) -> ClientResult<()> {
    let engine = Arc::new(build_engine(config, true)?);
    engine.restore().await?;

    let mut scheduler_config = config.scheduler_config();
    if let Some(secs) = interval {
        if secs == 0 {
            return Err(ClientError::Config(
                "--interval must be greater than zero".to_string(),
            ));
        }
        scheduler_config.sync_interval = Duration::from_secs(secs);
    }

    info!(
        departments = engine.feeds().len(),
        interval_secs = scheduler_config.sync_interval.as_secs(),
        policy = engine.failure_policy().as_str(),
        "Watching feeds"
    );

    let scheduler = Scheduler::new(scheduler_config);
    let handle = scheduler.handle();

    let sync_engine = engine.clone();
    let scheduler_task = tokio::spawn(async move {
        scheduler
            .run(move || {
                let engine = sync_engine.clone();
                async move {
                    match engine.sync_once().await {
                        Ok(summary) if summary.all_failed() => {
                            Err("no feed could be fetched".to_string())
                        }
                        Ok(_) => Ok(()),
                        Err(e) => Err(e.to_string()),
                    }
                }
            })
            .await;
    });

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    if let Err(e) = handle.stop().await {
        warn!(error = %e, "Failed to send stop command to scheduler");
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, scheduler_task)
        .await
        .is_err()
    {
        warn!("Scheduler did not stop in time");
    }

    let state = handle.state().await;
    info!(
        attempts = state.attempts,
        last_error = state.last_error.as_deref().unwrap_or("none"),
        "Stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DepartmentSettings, StorageSettings};

    fn config_in(dir: &std::path::Path) -> RoomcalConfig {
        RoomcalConfig {
            departments: vec![DepartmentSettings {
                id: "dept-1".to_string(),
                name: None,
                feed: dir.join("dept-1.ics").display().to_string(),
            }],
            storage: StorageSettings {
                dir: Some(dir.join("data")),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn zero_interval_in_config_is_rejected_before_watching() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.sync.interval_secs = 0;

        assert!(matches!(
            run(&config, None).await,
            Err(ClientError::Config(msg)) if msg.contains("interval_secs")
        ));
    }

    #[tokio::test]
    async fn zero_interval_flag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        assert!(matches!(
            run(&config, Some(0)).await,
            Err(ClientError::Config(msg)) if msg.contains("--interval")
        ));
    }
}
