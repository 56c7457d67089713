//! CLI, configuration, and command implementations
//!
//! This crate provides the `roomcal` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::RoomcalConfig;
pub use error::{ClientError, ClientResult};
