//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roomcal_core::CalendarMonth;

/// roomcal - Booking calendars merged into one availability view
#[derive(Debug, Parser)]
#[command(name = "roomcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ROOMCAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every feed once and update the stored snapshot
    Sync {
        /// Fetch and merge without writing the snapshot
        #[arg(long)]
        dry_run: bool,
    },

    /// Keep syncing in the foreground until interrupted
    Watch {
        /// Seconds between syncs (overrides the configuration)
        #[arg(long)]
        interval: Option<u64>,

        /// Log one JSON object per line
        #[arg(long)]
        json_logs: bool,
    },

    /// Show the free days of every department for a month
    Listing {
        /// Month to show, as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<CalendarMonth>,
    },

    /// Parse a local iCal file and show the days it blocks
    Parse {
        /// Feed file to parse
        file: PathBuf,

        /// Print the occupancy map as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_listing_month() {
        let cli = Cli::try_parse_from(["roomcal", "listing", "--month", "2024-06"]).unwrap();
        match cli.command {
            Command::Listing { month } => {
                assert_eq!(month, CalendarMonth::new(2024, 6));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_month() {
        assert!(Cli::try_parse_from(["roomcal", "listing", "--month", "2024-13"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["roomcal", "sync", "--dry-run", "--config", "/tmp/r.toml", "-v"])
                .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
        assert!(matches!(cli.command, Command::Sync { dry_run: true }));
    }

    #[test]
    fn config_subcommands() {
        let cli = Cli::try_parse_from(["roomcal", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Validate
            }
        ));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
