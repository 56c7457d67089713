//! roomcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use roomcal_core::{TracingConfig, TracingOutputFormat, init_tracing};

use roomcal_client::cli::{Cli, Command, ConfigAction};
use roomcal_client::commands;
use roomcal_client::config::RoomcalConfig;
use roomcal_client::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(RoomcalConfig::default_path);
    let config = if cli.config.is_some() {
        RoomcalConfig::load_from(&config_path)?
    } else {
        RoomcalConfig::load()?
    };

    init_tracing(tracing_config(&cli, &config))?;

    match cli.command {
        Command::Sync { dry_run } => commands::sync::run(&config, dry_run).await,
        Command::Watch { interval, .. } => commands::watch::run(&config, interval).await,
        Command::Listing { month } => commands::listing::run(&config, month),
        Command::Parse { ref file, json } => commands::parse::run(file, json).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config, &config_path),
        },
    }
}

fn tracing_config(cli: &Cli, config: &RoomcalConfig) -> TracingConfig {
    let debug = cli.debug || config.debug;
    match cli.command {
        Command::Watch { json_logs, .. } => {
            let tracing = if debug {
                TracingConfig::daemon().with_level(tracing::Level::DEBUG)
            } else {
                TracingConfig::daemon()
            };
            if json_logs {
                tracing.with_format(TracingOutputFormat::Json)
            } else {
                tracing
            }
        }
        _ if debug => TracingConfig::cli_debug(),
        _ => TracingConfig::cli(),
    }
}
