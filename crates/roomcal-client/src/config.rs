//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/roomcal/config.toml` by default:
//!
//! ```toml
//! [[departments]]
//! id = "dept-1"
//! name = "Departamento 1"
//! feed = "env::DEPT1_FEED"
//!
//! [sync]
//! interval_secs = 60
//! on_failure = "clear"
//! relay = "https://corsproxy.io/?"
//! ```
//!
//! `feed` values support the secret references of [`crate::secret`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roomcal_core::{Department, FailurePolicy};
use roomcal_providers::{FeedLocator, SourceOptions};
use roomcal_server::{DEFAULT_KEY, JsonFileStore, SchedulerConfig, SyncConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Configuration for the roomcal client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomcalConfig {
    /// Debug mode.
    pub debug: bool,

    /// Departments, in display order.
    pub departments: Vec<DepartmentSettings>,

    /// Sync settings.
    pub sync: SyncSettings,

    /// Snapshot storage settings.
    pub storage: StorageSettings,
}

/// One bookable department and its calendar feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentSettings {
    /// Key of the department in the snapshot.
    pub id: String,

    /// Display name, defaults to the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Feed URL, file path, or secret reference.
    pub feed: String,
}

impl DepartmentSettings {
    pub fn department(&self) -> Department {
        Department::new(
            self.id.clone(),
            self.name.clone().unwrap_or_else(|| self.id.clone()),
        )
    }

    /// Resolves secret references and parses the feed locator.
    pub fn locator(&self) -> Result<FeedLocator, String> {
        let raw = secret::resolve(&self.feed)?;
        raw.parse::<FeedLocator>().map_err(|e| e.to_string())
    }
}

/// Sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Seconds between syncs in `watch`.
    pub interval_secs: u64,

    /// What a failed feed does to the stored days: `clear` or `preserve`.
    pub on_failure: FailurePolicy,

    /// Prefix the percent-encoded feed URL is appended to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<String>,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_secs: SchedulerConfig::DEFAULT_INTERVAL_SECS,
            on_failure: FailurePolicy::default(),
            relay: None,
            timeout_secs: SourceOptions::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory of the snapshot file, defaults to the user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Name of the snapshot file, without extension.
    pub key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: None,
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl RoomcalConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roomcal")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roomcal")
    }

    /// Departments in display order.
    pub fn departments(&self) -> Vec<Department> {
        self.departments
            .iter()
            .map(DepartmentSettings::department)
            .collect()
    }

    /// Directory holding the snapshot file.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// The snapshot store described by `[storage]`.
    pub fn store(&self) -> ClientResult<JsonFileStore> {
        Ok(JsonFileStore::new(self.storage_dir(), &self.storage.key)?)
    }

    pub fn source_options(&self) -> SourceOptions {
        let options =
            SourceOptions::new().with_timeout(Duration::from_secs(self.sync.timeout_secs));
        match self.sync.relay {
            Some(ref relay) if !relay.is_empty() => options.with_relay(relay),
            _ => options,
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.sync.on_failure)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_secs(self.sync.interval_secs))
    }

    /// Checks the configuration without contacting any feed.
    ///
    /// Secret references are not resolved; their locators are checked when
    /// the feeds are built.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for department in &self.departments {
            if department.id.trim().is_empty() {
                return Err("department id must not be empty".to_string());
            }
            if !seen.insert(department.id.as_str()) {
                return Err(format!("duplicate department id '{}'", department.id));
            }
            if !secret::is_reference(&department.feed) {
                department
                    .feed
                    .parse::<FeedLocator>()
                    .map_err(|e| format!("department '{}': {}", department.id, e))?;
            }
        }

        if self.sync.interval_secs == 0 {
            return Err("sync.interval_secs must be greater than zero".to_string());
        }
        if self.sync.timeout_secs == 0 {
            return Err("sync.timeout_secs must be greater than zero".to_string());
        }

        JsonFileStore::new(self.storage_dir(), &self.storage.key).map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[departments]]
id = "dept-1"
name = "Departamento 1"
feed = "https://ical.booking.com/v1/export?t=abc"

[[departments]]
id = "dept-2"
feed = "webcal://www.airbnb.com/calendar/ical/42.ics"

[sync]
on_failure = "preserve"
relay = "https://corsproxy.io/?"

[storage]
dir = "/var/lib/roomcal"
"#;

    #[test]
    fn defaults() {
        let config = RoomcalConfig::default();
        assert!(config.departments.is_empty());
        assert_eq!(config.sync.interval_secs, 60);
        assert_eq!(config.sync.timeout_secs, 30);
        assert_eq!(config.sync.on_failure, FailurePolicy::Clear);
        assert_eq!(config.storage.key, "calendar_availability");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_sample() {
        let config = RoomcalConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.departments.len(), 2);
        assert_eq!(
            config.departments(),
            vec![
                Department::new("dept-1", "Departamento 1"),
                Department::new("dept-2", "dept-2"),
            ]
        );
        assert_eq!(config.sync.on_failure, FailurePolicy::Preserve);
        assert_eq!(config.sync.interval_secs, 60);
        assert_eq!(
            config.source_options().relay.as_deref(),
            Some("https://corsproxy.io/?")
        );
        assert_eq!(config.storage_dir(), PathBuf::from("/var/lib/roomcal"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn locator_rewrites_webcal() {
        let config = RoomcalConfig::parse(SAMPLE).unwrap();
        let locator = config.departments[1].locator().unwrap();
        assert_eq!(
            locator.to_string(),
            "https://www.airbnb.com/calendar/ical/42.ics"
        );
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(RoomcalConfig::parse("[sync]\non_failure = \"merge\"\n").is_err());
    }

    #[test]
    fn validate_catches_mistakes() {
        let duplicate = RoomcalConfig::parse(
            "[[departments]]\nid = \"a\"\nfeed = \"a.ics\"\n\n[[departments]]\nid = \"a\"\nfeed = \"b.ics\"\n",
        )
        .unwrap();
        assert!(duplicate.validate().unwrap_err().contains("duplicate"));

        let bad_scheme =
            RoomcalConfig::parse("[[departments]]\nid = \"a\"\nfeed = \"ftp://x/a.ics\"\n")
                .unwrap();
        assert!(bad_scheme.validate().unwrap_err().contains("'a'"));

        let secret_ref =
            RoomcalConfig::parse("[[departments]]\nid = \"a\"\nfeed = \"env::UNSET_FEED\"\n")
                .unwrap();
        assert!(secret_ref.validate().is_ok());

        let zero_interval = RoomcalConfig::parse("[sync]\ninterval_secs = 0\n").unwrap();
        assert!(zero_interval.validate().is_err());

        let bad_key = RoomcalConfig::parse("[storage]\nkey = \"../up\"\n").unwrap();
        assert!(bad_key.validate().is_err());
    }

    #[test]
    fn dump_round_trips() {
        let config = RoomcalConfig::parse(SAMPLE).unwrap();
        let dumped = toml::to_string_pretty(&config).unwrap();
        let reparsed = RoomcalConfig::parse(&dumped).unwrap();
        assert_eq!(reparsed.departments(), config.departments());
        assert_eq!(reparsed.sync.relay, config.sync.relay);
        assert_eq!(reparsed.storage.dir, config.storage.dir);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = RoomcalConfig::load_from(&path).unwrap();
        assert_eq!(config.departments.len(), 2);

        let missing = RoomcalConfig::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ClientError::Config(_))));
    }
}
