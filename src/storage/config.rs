use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::watch::options::{
    DEFAULT_BACKOFF_CEILING, DEFAULT_BACKOFF_STREAK, DEFAULT_CONFIRM_WINDOW, DEFAULT_FAST_INTERVAL,
    DEFAULT_MONITOR_INTERVAL, DEFAULT_SLOW_INTERVAL, DEFAULT_TICK_INTERVAL,
};
use crate::watch::{DoubleSubmitOptions, WatchOptions};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Poll cadence and double-copy heuristics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchConfig {
    /// Poll interval of raw watches
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Text watch interval while the clipboard is active
    #[serde(default = "default_fast_interval_ms")]
    pub fast_interval_ms: u64,

    /// Text watch interval after a streak of idle ticks
    #[serde(default = "default_slow_interval_ms")]
    pub slow_interval_ms: u64,

    /// Two identical copies closer than this confirm each other
    #[serde(default = "default_confirm_window_ms")]
    pub confirm_window_ms: u64,

    #[serde(default = "default_backoff_streak")]
    pub backoff_streak: u32,

    #[serde(default = "default_backoff_ceiling")]
    pub backoff_ceiling: u32,

    /// How often a write monitor checks for an overwrite
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,

    /// Stop write monitors after this many seconds (unset = never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_timeout_secs: Option<u64>,

    /// Ignore copied text longer than this many characters (unset = no limit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_text_len: Option<usize>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            tick_interval_ms: default_tick_interval_ms(),
            fast_interval_ms: default_fast_interval_ms(),
            slow_interval_ms: default_slow_interval_ms(),
            confirm_window_ms: default_confirm_window_ms(),
            backoff_streak: default_backoff_streak(),
            backoff_ceiling: default_backoff_ceiling(),
            monitor_interval_ms: default_monitor_interval_ms(),
            monitor_timeout_secs: None,
            max_text_len: None,
        }
    }
}

impl WatchConfig {
    /// Convert to the library's watch options
    pub fn to_options(&self) -> WatchOptions {
        WatchOptions {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            double_submit: DoubleSubmitOptions {
                fast_interval: Duration::from_millis(self.fast_interval_ms),
                slow_interval: Duration::from_millis(self.slow_interval_ms),
                confirm_window: Duration::from_millis(self.confirm_window_ms),
                backoff_streak: self.backoff_streak,
                backoff_ceiling: self.backoff_ceiling,
                max_text_len: self.max_text_len,
            },
            monitor_interval: Duration::from_millis(self.monitor_interval_ms),
            monitor_timeout: self.monitor_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Timestamp / date conversion of confirmed copies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Longer input is not considered for conversion
    #[serde(default = "default_max_input_len")]
    pub max_input_len: usize,

    /// Exclusive lower bound of Unix timestamps in seconds
    #[serde(default = "default_seconds_min")]
    pub seconds_min: i64,

    /// Exclusive upper bound of seconds, and lower bound of milliseconds
    #[serde(default = "default_seconds_max")]
    pub seconds_max: i64,

    /// Exclusive upper bound of Unix timestamps in milliseconds
    #[serde(default = "default_millis_max")]
    pub millis_max: i64,

    /// strftime format of converted timestamps
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Copy the Unix timestamp of a parsed date back to the clipboard
    #[serde(default = "default_true")]
    pub write_back_timestamp: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            max_input_len: default_max_input_len(),
            seconds_min: default_seconds_min(),
            seconds_max: default_seconds_max(),
            millis_max: default_millis_max(),
            date_format: default_date_format(),
            write_back_timestamp: true,
        }
    }
}

/// Desktop notification settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_summary")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,

    #[serde(default = "default_notification_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            enabled: true,
            summary: default_summary(),
            icon: None,
            timeout_ms: default_notification_timeout_ms(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to a daily rotated file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

// Default value functions for serde
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_tick_interval_ms() -> u64 {
    millis(DEFAULT_TICK_INTERVAL)
}

fn default_fast_interval_ms() -> u64 {
    millis(DEFAULT_FAST_INTERVAL)
}

fn default_slow_interval_ms() -> u64 {
    millis(DEFAULT_SLOW_INTERVAL)
}

fn default_confirm_window_ms() -> u64 {
    millis(DEFAULT_CONFIRM_WINDOW)
}

fn default_backoff_streak() -> u32 {
    DEFAULT_BACKOFF_STREAK
}

fn default_backoff_ceiling() -> u32 {
    DEFAULT_BACKOFF_CEILING
}

fn default_monitor_interval_ms() -> u64 {
    millis(DEFAULT_MONITOR_INTERVAL)
}

fn default_max_input_len() -> usize {
    40
}

fn default_seconds_min() -> i64 {
    10_000_000
}

fn default_seconds_max() -> i64 {
    10_013_221_020
}

fn default_millis_max() -> i64 {
    2_101_322_102_000
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_summary() -> String {
    "Time conversion".to_string()
}

fn default_notification_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        use anyhow::Context;
        use std::fs;

        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);
        log::debug!("Config: {:?}", config);

        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        let toml_str = toml::to_string_pretty(config)
            .with_context(|| "Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);

        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        use anyhow::Context;
        use std::fs;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../clipwatch.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.watch.tick_interval_ms, 100);
        assert_eq!(config.watch.confirm_window_ms, 500);
        assert_eq!(config.watch.backoff_streak, 50);
        assert_eq!(config.watch.backoff_ceiling, 100);
        assert_eq!(config.convert.max_input_len, 40);
        assert!(config.notification.enabled);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_defaults_match_library_options() {
        assert_eq!(WatchConfig::default().to_options(), WatchOptions::default());
    }

    #[test]
    fn test_missing_watch_keys_use_library_constants() {
        let config: Config = toml::from_str("[watch]\n").unwrap();
        let options = config.watch.to_options();
        assert_eq!(options.tick_interval, DEFAULT_TICK_INTERVAL);
        assert_eq!(options.double_submit.confirm_window, DEFAULT_CONFIRM_WINDOW);
        assert_eq!(options.double_submit.backoff_streak, DEFAULT_BACKOFF_STREAK);
        assert_eq!(options.monitor_interval, DEFAULT_MONITOR_INTERVAL);
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let config: Config = toml::from_str(include_str!("../../clipwatch.toml.example")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
        [watch]
        confirm_window_ms = 800
        monitor_timeout_secs = 30

        [notification]
        enabled = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        let options = config.watch.to_options();
        assert_eq!(options.double_submit.confirm_window, Duration::from_millis(800));
        assert_eq!(options.monitor_timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.tick_interval, Duration::from_millis(100));
        assert!(!config.notification.enabled);
        assert_eq!(config.notification.summary, "Time conversion");
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("clipwatch-config-{}", std::process::id()));
        let storage = TomlConfigStorage::new(dir.join("clipwatch.toml"));

        let mut config = Config::default();
        config.convert.date_format = "%d/%m/%Y %H:%M".to_string();
        config.watch.max_text_len = Some(64);
        storage.save(&config).unwrap();

        assert_eq!(storage.load().unwrap(), config);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
