//! Weather Monitor Core Library
//!
//! Shared utilities for the monitor binary and library:
//! - Configuration loading (XDG-compliant)
//! - File system utilities
//! - Application constants

mod config;
pub mod fs;

pub use config::{config_home, find_config_file, load_config, ConfigSource};
pub use fs::{create_dir_all, sanitize_file_name, write_file};

/// Application name used for XDG paths
pub const APP_NAME: &str = "weather-monitor";

/// Config file name searched for in the standard locations
pub const CONFIG_FILE_NAME: &str = "monitor.toml";

/// Environment variable holding an explicit config file path
pub const CONFIG_ENV_VAR: &str = "WEATHER_MONITOR_CONFIG";

/// Longest forecast horizon the forecast API serves
pub const MAX_FORECAST_DAYS: u8 = 16;

/// Days of archive data scanned for past extreme events
pub const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Watch mode interval (1 hour)
pub const DEFAULT_WATCH_INTERVAL: u64 = 3600;

/// Lifetime of a cached API response (10 minutes)
pub const DEFAULT_CACHE_TTL: u64 = 600;
