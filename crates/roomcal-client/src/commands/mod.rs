//! Subcommand implementations.

pub mod config;
pub mod listing;
pub mod parse;
pub mod sync;
pub mod watch;
