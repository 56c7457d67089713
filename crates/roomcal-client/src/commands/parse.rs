//! Parse command: run the transducer on a local feed file.

use std::fmt::Write as _;
use std::path::Path;

use roomcal_core::{FeedParse, canonical_date};
use roomcal_providers::{FileFeedSource, fetch_occupancy};

use crate::error::{ClientError, ClientResult};

pub async fn run(file: &Path, json: bool) -> ClientResult<()> {
    let source = FileFeedSource::new(file);
    let parse = fetch_occupancy(&source).await?;

    if json {
        let out = serde_json::to_string_pretty(&parse.occupancy)
            .map_err(|e| ClientError::Config(format!("failed to serialize occupancy: {}", e)))?;
        println!("{}", out);
        for warning in &parse.warnings {
            eprintln!("warning: {}", warning);
        }
    } else {
        print!("{}", render(&file.display().to_string(), &parse));
    }
    Ok(())
}

/// Blocked days one per line, then warnings.
pub fn render(label: &str, parse: &FeedParse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} events, {} blocked days",
        label,
        parse.events,
        parse.occupancy.blocked_count()
    );
    for day in parse.occupancy.blocked_days() {
        let _ = writeln!(out, "  {}", canonical_date(day));
    }
    if !parse.warnings.is_empty() {
        let _ = writeln!(out, "warnings:");
        for warning in &parse.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcal_core::parse_feed;

    #[test]
    fn render_days_and_warnings() {
        let parse = parse_feed(
            "BEGIN:VEVENT\r\nDTSTART:20240301\r\nDTEND:20240303\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nDTSTART:20231301\r\nEND:VEVENT\r\n",
        );
        let text = render("feed.ics", &parse);

        assert!(text.starts_with("feed.ics: 2 events, 2 blocked days\n  2024-03-01\n  2024-03-02\n"));
        assert!(text.contains("warnings:\n  "));
        assert!(text.contains("20231301"));
    }

    #[tokio::test]
    async fn missing_file_is_a_feed_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&dir.path().join("none.ics"), false).await;
        assert!(matches!(result, Err(ClientError::Provider(_))));
    }
}
