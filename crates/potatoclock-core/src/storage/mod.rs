mod config;
pub mod database;
pub mod local;

pub use config::{Config, GridConfig, SyncConfig};
pub use database::Database;
pub use local::LocalStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `POTATOCLOCK_DATA_DIR` wins when set. Otherwise `~/.config/potatoclock/`,
/// or `~/.config/potatoclock-dev/` when `POTATOCLOCK_ENV=dev`.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POTATOCLOCK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("POTATOCLOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("potatoclock-dev")
            } else {
                base_dir.join("potatoclock")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
