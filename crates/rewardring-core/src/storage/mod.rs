mod config;

pub use config::{Config, ProgressSettings};

use std::path::PathBuf;

/// Returns the directory holding `config.toml`.
///
/// `REWARDRING_HOME` wins when set. Otherwise `~/.config/rewardring[-dev]/`
/// based on REWARDRING_ENV; set REWARDRING_ENV=dev to use the development
/// directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("REWARDRING_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("REWARDRING_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("rewardring-dev")
            } else {
                base_dir.join("rewardring")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
