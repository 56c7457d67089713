//! Feeds stored on the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{ProviderError, ProviderResult};
use crate::source::{BoxFuture, FeedSource};

/// A feed read from a local `.ics` file.
#[derive(Debug, Clone)]
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> ProviderResult<String> {
        trace!(path = %self.path.display(), "Reading feed file");
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            let message = format!("{}: {}", self.path.display(), e);
            let error = match e.kind() {
                ErrorKind::NotFound => ProviderError::not_found(message),
                ErrorKind::PermissionDenied => ProviderError::authorization(message),
                ErrorKind::InvalidData => ProviderError::invalid_response(message),
                _ => ProviderError::io(message),
            };
            error.with_cause(e)
        })
    }
}

impl FeedSource for FileFeedSource {
    fn kind(&self) -> &str {
        "file"
    }

    fn locator(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch_feed(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move { self.read().await.map_err(|e| e.with_source_kind("file")) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::source::fetch_occupancy;

    #[tokio::test]
    async fn reads_feed_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dept-1.ics");
        std::fs::write(
            &path,
            "BEGIN:VCALENDAR\nBEGIN:VEVENT\nDTSTART;VALUE=DATE:20240101\nEND:VEVENT\nEND:VCALENDAR\n",
        )
        .unwrap();

        let source = FileFeedSource::new(&path);
        assert_eq!(source.kind(), "file");
        assert_eq!(source.path(), path.as_path());

        let parse = fetch_occupancy(&source).await.unwrap();
        assert_eq!(parse.occupancy.blocked_count(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileFeedSource::new(dir.path().join("absent.ics"));

        let err = source.fetch_feed().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert_eq!(err.source_kind(), Some("file"));
        assert!(err.message().contains("absent.ics"));
    }

    #[tokio::test]
    async fn non_utf8_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.ics");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x42]).unwrap();

        let err = FileFeedSource::new(&path).fetch_feed().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }
}
