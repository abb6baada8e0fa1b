pub mod config;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

pub use config::{
    Config, ConfigStorage, ConvertConfig, LogConfig, NotificationConfig, TomlConfigStorage,
    WatchConfig,
};

/// Ensure XDG data and config directories exist
/// Returns (data_dir, config_dir)
///
/// XDG Base Directory Specification:
/// - Data: $XDG_DATA_HOME/clipwatch (default: ~/.local/share/clipwatch)
/// - Config: $XDG_CONFIG_HOME/clipwatch (default: ~/.config/clipwatch)
pub fn ensure_directories() -> Result<(PathBuf, PathBuf)> {
    let home = env::var("HOME").context("HOME environment variable not set")?;
    let home_path = PathBuf::from(home);

    let data_dir = if let Ok(xdg_data) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("clipwatch")
    } else {
        home_path.join(".local/share/clipwatch")
    };

    let config_dir = if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("clipwatch")
    } else {
        home_path.join(".config/clipwatch")
    };

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

    log::debug!("Data directory: {:?}", data_dir);
    log::debug!("Config directory: {:?}", config_dir);

    Ok((data_dir, config_dir))
}

/// Expand a leading `~/` against $HOME
pub fn expand_home(path: PathBuf) -> PathBuf {
    if let (Ok(rest), Ok(home)) = (path.strip_prefix("~"), env::var("HOME")) {
        return PathBuf::from(home).join(rest);
    }
    path
}
