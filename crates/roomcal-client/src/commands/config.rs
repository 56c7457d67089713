//! Configuration commands.

use std::path::Path;

use crate::config::RoomcalConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &RoomcalConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &RoomcalConfig) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    for department in &config.departments {
        department.locator().map_err(|e| {
            ClientError::Config(format!("department '{}': {}", department.id, e))
        })?;
    }

    println!(
        "Configuration is valid: {} departments, snapshot at {}.",
        config.departments.len(),
        config.store()?.path().display()
    );
    Ok(())
}

/// Show the configuration and snapshot paths.
pub fn path(config: &RoomcalConfig, path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    println!("snapshot: {}", config.store()?.path().display());
    Ok(())
}
