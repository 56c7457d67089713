//! One-shot sync and the engine shared with `watch`.

use std::sync::Arc;

use roomcal_providers::{ErrorSource, FeedSource, ProviderError, source_from_locator};
use roomcal_server::{SyncEngine, SyncSummary};
use tracing::{debug, warn};

use crate::config::RoomcalConfig;
use crate::error::{ClientError, ClientResult};

/// Builds a sync engine for every configured department.
///
/// The configuration is validated first. A department whose feed cannot be turned into a source still gets an
/// entry: it fails on every sync and follows the failure policy like any
/// other unreachable feed.
pub fn build_engine(config: &RoomcalConfig, persist: bool) -> ClientResult<SyncEngine> {
    if config.departments.is_empty() {
        return Err(ClientError::Config(format!(
            "no departments configured; add a [[departments]] entry to {}",
            RoomcalConfig::default_path().display()
        )));
    }
    config.validate().map_err(ClientError::Config)?;

    let store = Arc::new(config.store()?);
    let sync_config = config.sync_config().with_persist(persist);
    let options = config.source_options();

    let mut engine = SyncEngine::new(store, sync_config);
    for department in &config.departments {
        let source: Arc<dyn FeedSource> = match department
            .locator()
            .map_err(ProviderError::configuration)
            .and_then(|locator| source_from_locator(&locator, &options))
        {
            Ok(source) => {
                debug!(
                    department = %department.id,
                    kind = source.kind(),
                    locator = %source.locator(),
                    "Feed registered"
                );
                Arc::from(source)
            }
            Err(e) => {
                warn!(department = %department.id, error = %e, "Unusable feed");
                Arc::new(ErrorSource::new(department.id.clone(), e))
            }
        };
        engine.add_feed(department.id.clone(), source);
    }
    Ok(engine)
}

/// Runs one sync cycle and prints its summary.
pub async fn run(config: &RoomcalConfig, dry_run: bool) -> ClientResult<()> {
    let engine = build_engine(config, !dry_run)?;
    engine.restore().await?;

    let summary = engine.sync_once().await?;
    print!("{}", render_summary(&summary));

    if summary.all_failed() {
        return Err(ClientError::Sync("no feed could be fetched".to_string()));
    }
    Ok(())
}

/// Human-readable summary of a sync.
pub fn render_summary(summary: &SyncSummary) -> String {
    let mut out = format!(
        "{} fetched, {} failed, {} blocked days, {} warnings{}\n",
        summary.fetched,
        summary.failed(),
        summary.blocked_days,
        summary.warnings,
        if summary.persisted { "" } else { " (not saved)" }
    );
    for failure in &summary.failures {
        let action = if summary.report.preserved.contains(&failure.resource) {
            "kept previous days"
        } else {
            "cleared"
        };
        out.push_str(&format!(
            "  {}: {} ({})\n",
            failure.resource, failure.reason, action
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DepartmentSettings, StorageSettings};
    use roomcal_server::{FeedFailure, SnapshotStore};

    fn config_in(dir: &std::path::Path, feeds: &[(&str, String)]) -> RoomcalConfig {
        RoomcalConfig {
            departments: feeds
                .iter()
                .map(|(id, feed)| DepartmentSettings {
                    id: id.to_string(),
                    name: None,
                    feed: feed.clone(),
                })
                .collect(),
            storage: StorageSettings {
                dir: Some(dir.join("data")),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn no_departments_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &[]);
        assert!(matches!(
            build_engine(&config, true),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn duplicate_department_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            &[
                ("dept-1", "a.ics".to_string()),
                ("dept-1", "b.ics".to_string()),
            ],
        );
        assert!(matches!(
            build_engine(&config, true),
            Err(ClientError::Config(msg)) if msg.contains("duplicate department id 'dept-1'")
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path(), &[("dept-1", "a.ics".to_string())]);
        config.sync.timeout_secs = 0;
        assert!(matches!(
            build_engine(&config, true),
            Err(ClientError::Config(msg)) if msg.contains("timeout_secs")
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path(), &[("dept-1", "a.ics".to_string())]);
        config.sync.interval_secs = 0;
        assert!(matches!(
            build_engine(&config, true),
            Err(ClientError::Config(msg)) if msg.contains("interval_secs")
        ));
    }

    #[test]
    fn unresolvable_secret_becomes_failing_feed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            &[("dept-1", "env::ROOMCAL_TEST_UNSET_FEED_URL".to_string())],
        );
        let engine = build_engine(&config, true).unwrap();
        assert_eq!(engine.feeds().len(), 1);
        assert_eq!(engine.feeds()[0].source.kind(), "error");
    }

    #[tokio::test]
    async fn sync_from_files_persists_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let feed = dir.path().join("dept-1.ics");
        std::fs::write(
            &feed,
            "BEGIN:VEVENT\nDTSTART;VALUE=DATE:20240610\nDTEND;VALUE=DATE:20240612\nEND:VEVENT\n",
        )
        .unwrap();
        let config = config_in(
            dir.path(),
            &[
                ("dept-1", feed.display().to_string()),
                ("dept-2", "env::ROOMCAL_TEST_UNSET_FEED_URL".to_string()),
            ],
        );

        run(&config, false).await.unwrap();

        let stored = config.store().unwrap().load().unwrap();
        assert_eq!(stored.blocked_count(), 2);
        assert!(stored.contains("dept-2"));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let feed = dir.path().join("dept-1.ics");
        std::fs::write(&feed, "").unwrap();
        let config = config_in(dir.path(), &[("dept-1", feed.display().to_string())]);

        run(&config, true).await.unwrap();
        assert!(!config.store().unwrap().path().exists());
    }

    #[tokio::test]
    async fn all_feeds_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ics").display().to_string();
        let config = config_in(dir.path(), &[("dept-1", missing)]);

        assert!(matches!(
            run(&config, false).await,
            Err(ClientError::Sync(_))
        ));
    }

    #[test]
    fn summary_lists_failures() {
        let mut summary = SyncSummary {
            fetched: 3,
            blocked_days: 41,
            warnings: 1,
            persisted: true,
            failures: vec![FeedFailure {
                resource: "dept-4".to_string(),
                reason: "[http] server_error: Server error (502 Bad Gateway)".to_string(),
            }],
            ..Default::default()
        };
        summary.report.cleared.push("dept-4".to_string());

        assert_eq!(
            render_summary(&summary),
            "3 fetched, 1 failed, 41 blocked days, 1 warnings\n  \
             dept-4: [http] server_error: Server error (502 Bad Gateway) (cleared)\n"
        );
    }
}
