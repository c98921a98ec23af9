mod backend;
mod config;
mod store;

pub use backend::{KvBackend, MemoryBackend, SqliteBackend};
pub use config::{CalendarConfig, Config, GamificationConfig, LoggingConfig, RescueConfig};
pub use store::{Key, Store, WriteBatch};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `EXAMPREP_DATA_DIR` wins when set. Otherwise `~/.config/examprep[-dev]/`
/// based on `EXAMPREP_ENV` (set `EXAMPREP_ENV=dev` for the development dir).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("EXAMPREP_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("EXAMPREP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("examprep-dev")
            } else {
                base_dir.join("examprep")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
