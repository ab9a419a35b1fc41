use clap::{Args, Parser, Subcommand};
use slog::{o, Drain, Level, Logger};
use std::{env, path::PathBuf, time::Duration};
use weather_monitor_core::{
    find_config_file, load_config, ConfigSource, CONFIG_ENV_VAR, CONFIG_FILE_NAME,
    DEFAULT_CACHE_TTL, DEFAULT_HISTORY_DAYS, DEFAULT_WATCH_INTERVAL, MAX_FORECAST_DAYS,
};

use crate::{FetchSettings, FireQuery, Thresholds};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Weather Monitor - Forecasts, air quality, wildfires and extreme weather events"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $WEATHER_MONITOR_CONFIG, ./monitor.toml,
    /// $XDG_CONFIG_HOME/weather-monitor/monitor.toml, /etc/weather-monitor/monitor.toml
    #[arg(short, long, global = true)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, global = true, env = "WEATHER_MONITOR_LEVEL")]
    pub level: Option<String>,

    /// Language of geocoding results
    #[arg(long, global = true, env = "WEATHER_MONITOR_LANGUAGE")]
    pub language: Option<String>,

    /// Timezone used when a location has none ("auto" resolves from coordinates)
    #[arg(long, global = true, env = "WEATHER_MONITOR_TIMEZONE")]
    pub timezone: Option<String>,

    /// Days fetched for the extended forecast (1-16)
    #[arg(long, global = true, env = "WEATHER_MONITOR_FORECAST_DAYS")]
    pub forecast_days: Option<u8>,

    /// Days of history scanned for extreme events
    #[arg(long, global = true, env = "WEATHER_MONITOR_HISTORY_DAYS")]
    pub history_days: Option<u32>,

    /// Daily precipitation above this many mm is extreme
    #[arg(long, global = true, env = "WEATHER_MONITOR_PRECIPITATION_THRESHOLD")]
    pub precipitation_threshold: Option<f64>,

    /// Daily max wind above this many km/h is a gust event
    #[arg(long, global = true, env = "WEATHER_MONITOR_WIND_THRESHOLD")]
    pub wind_threshold: Option<f64>,

    /// Daily max temperature (°C) reached on every day of a heat wave
    #[arg(long, global = true, env = "WEATHER_MONITOR_HEAT_THRESHOLD")]
    pub heat_threshold: Option<f64>,

    /// Daily min temperature (°C) reached on every day of a cold wave
    #[arg(long, global = true, env = "WEATHER_MONITOR_COLD_THRESHOLD")]
    pub cold_threshold: Option<f64>,

    /// Consecutive days making a heat or cold wave
    #[arg(long, global = true, env = "WEATHER_MONITOR_WAVE_DAYS")]
    pub wave_days: Option<usize>,

    /// NASA FIRMS map key
    #[arg(long, global = true, env = "WEATHER_MONITOR_FIRMS_API_KEY")]
    pub firms_api_key: Option<String>,

    /// NASA FIRMS satellite source
    #[arg(long, global = true, env = "WEATHER_MONITOR_FIRMS_SOURCE")]
    pub firms_source: Option<String>,

    /// Radius in km searched for fire hotspots
    #[arg(long, global = true, env = "WEATHER_MONITOR_FIRE_RADIUS_KM")]
    pub fire_radius_km: Option<f64>,

    /// Days searched back for fire hotspots (at most 10)
    #[arg(long, global = true, env = "WEATHER_MONITOR_FIRE_DAYS_BACK")]
    pub fire_days_back: Option<u32>,

    /// Static map API key added to satellite image links
    #[arg(long, global = true, env = "WEATHER_MONITOR_MAPS_API_KEY")]
    pub maps_api_key: Option<String>,

    /// Directory saved reports are written to
    #[arg(long, global = true, env = "WEATHER_MONITOR_REPORTS_DIR")]
    pub reports_dir: Option<String>,

    /// HTTP User-Agent header for API requests
    #[arg(long, global = true, env = "WEATHER_MONITOR_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Rate limiter refill rate in tokens per second
    #[arg(long, global = true, env = "WEATHER_MONITOR_REFILL_RATE")]
    pub refill_rate: Option<f64>,

    /// Rate limiter token capacity
    #[arg(long, global = true, env = "WEATHER_MONITOR_TOKEN_CAPACITY")]
    pub token_capacity: Option<usize>,

    /// Retries for transient HTTP failures
    #[arg(long, global = true, env = "WEATHER_MONITOR_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "WEATHER_MONITOR_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Seconds an API response is reused, 0 disables caching
    #[arg(long, global = true, env = "WEATHER_MONITOR_CACHE_TTL")]
    pub cache_ttl: Option<u64>,

    /// Seconds between scans in watch mode
    #[arg(long, global = true, env = "WEATHER_MONITOR_WATCH_INTERVAL")]
    pub watch_interval: Option<u64>,

    #[arg(long, global = true, env = "WEATHER_MONITOR_GEOCODING_URL")]
    pub geocoding_url: Option<String>,

    #[arg(long, global = true, env = "WEATHER_MONITOR_FORECAST_URL")]
    pub forecast_url: Option<String>,

    #[arg(long, global = true, env = "WEATHER_MONITOR_ARCHIVE_URL")]
    pub archive_url: Option<String>,

    #[arg(long, global = true, env = "WEATHER_MONITOR_AIR_QUALITY_URL")]
    pub air_quality_url: Option<String>,

    #[arg(long, global = true, env = "WEATHER_MONITOR_FIRMS_URL")]
    pub firms_url: Option<String>,

    #[command(subcommand)]
    #[serde(skip)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// List locations matching a name
    Search { name: String },
    /// Current conditions
    Current(LocationArgs),
    /// Daily forecast table with upcoming alerts
    Forecast {
        #[command(flatten)]
        location: LocationArgs,
        /// Days shown, more than 7 shows the extended view
        #[arg(long, default_value_t = 7)]
        days: u8,
    },
    /// Extreme events found in recent history
    Events {
        #[command(flatten)]
        location: LocationArgs,
        /// Days of history scanned
        #[arg(long)]
        days: Option<u32>,
    },
    /// Satellite fire hotspots nearby
    Fires(LocationArgs),
    /// Air quality
    Air(LocationArgs),
    /// Technical report for recent extreme events
    Report {
        #[command(flatten)]
        location: LocationArgs,
        /// Only the event on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Write the report to the reports directory
        #[arg(long)]
        save: bool,
    },
    /// Every view in sequence
    Overview(LocationArgs),
    /// Scan the forecast periodically and log upcoming alerts
    Watch(LocationArgs),
    /// List the reports saved in the reports directory
    Reports,
}

impl Command {
    pub fn location(&self) -> Option<&LocationArgs> {
        match self {
            Command::Search { .. } | Command::Reports => None,
            Command::Current(location)
            | Command::Fires(location)
            | Command::Air(location)
            | Command::Overview(location)
            | Command::Watch(location)
            | Command::Forecast { location, .. }
            | Command::Events { location, .. }
            | Command::Report { location, .. } => Some(location),
        }
    }
}

#[derive(Args, Clone, Debug, Default, PartialEq)]
pub struct LocationArgs {
    /// Location name to search for
    #[arg(long, conflicts_with = "lat")]
    pub city: Option<String>,

    /// Which of the matching locations to use
    #[arg(long, default_value_t = 0)]
    pub pick: usize,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    pub fn named(city: &str) -> Self {
        LocationArgs {
            city: Some(city.to_string()),
            ..Default::default()
        }
    }

    pub fn at(lat: f64, lon: f64) -> Self {
        LocationArgs {
            lat: Some(lat),
            lon: Some(lon),
            ..Default::default()
        }
    }
}

/// Base urls and request parameters of the remote APIs
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoints {
    pub geocoding_url: String,
    pub language: String,
    pub forecast_url: String,
    pub timezone: String,
    pub archive_url: String,
    pub air_quality_url: String,
    pub firms_url: String,
    pub firms_api_key: String,
    pub firms_source: String,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn language(&self) -> String {
        self.language.clone().unwrap_or_else(|| "en".to_string())
    }

    pub fn timezone(&self) -> String {
        self.timezone.clone().unwrap_or_else(|| "auto".to_string())
    }

    pub fn forecast_days(&self) -> u8 {
        self.forecast_days
            .unwrap_or(MAX_FORECAST_DAYS)
            .clamp(1, MAX_FORECAST_DAYS)
    }

    pub fn history_days(&self) -> u32 {
        self.history_days.unwrap_or(DEFAULT_HISTORY_DAYS)
    }

    pub fn thresholds(&self) -> Thresholds {
        let defaults = Thresholds::default();
        Thresholds {
            precipitation_mm: self
                .precipitation_threshold
                .unwrap_or(defaults.precipitation_mm),
            wind_kmh: self.wind_threshold.unwrap_or(defaults.wind_kmh),
            heat_c: self.heat_threshold.unwrap_or(defaults.heat_c),
            cold_c: self.cold_threshold.unwrap_or(defaults.cold_c),
            wave_days: self.wave_days.unwrap_or(defaults.wave_days).max(1),
        }
    }

    pub fn fire_query(&self) -> FireQuery {
        let defaults = FireQuery::default();
        FireQuery {
            radius_km: self.fire_radius_km.unwrap_or(defaults.radius_km),
            days_back: self.fire_days_back.unwrap_or(defaults.days_back),
        }
    }

    pub fn maps_api_key(&self) -> Option<String> {
        self.maps_api_key.clone().filter(|key| !key.is_empty())
    }

    pub fn reports_dir(&self) -> PathBuf {
        PathBuf::from(
            self.reports_dir
                .clone()
                .unwrap_or_else(|| "./reports".to_string()),
        )
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("weather-monitor/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Tokens per second, a rate that is not a positive number falls back to 5
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(5.0)
    }

    pub fn token_capacity(&self) -> usize {
        self.token_capacity.unwrap_or(10)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(3)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(20))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL))
    }

    pub fn watch_interval(&self) -> u64 {
        self.watch_interval.unwrap_or(DEFAULT_WATCH_INTERVAL).max(1)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            user_agent: self.user_agent(),
            timeout: self.timeout(),
            max_retries: self.max_retries(),
            cache_ttl: self.cache_ttl(),
            secrets: [Some(self.endpoints().firms_api_key), self.maps_api_key()]
                .into_iter()
                .flatten()
                .collect(),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            geocoding_url: self
                .geocoding_url
                .clone()
                .unwrap_or_else(|| "https://geocoding-api.open-meteo.com".to_string()),
            language: self.language(),
            forecast_url: self
                .forecast_url
                .clone()
                .unwrap_or_else(|| "https://api.open-meteo.com".to_string()),
            timezone: self.timezone(),
            archive_url: self
                .archive_url
                .clone()
                .unwrap_or_else(|| "https://archive-api.open-meteo.com".to_string()),
            air_quality_url: self
                .air_quality_url
                .clone()
                .unwrap_or_else(|| "https://air-quality-api.open-meteo.com".to_string()),
            firms_url: self
                .firms_url
                .clone()
                .unwrap_or_else(|| "https://firms.modaps.eosdis.nasa.gov".to_string()),
            firms_api_key: self
                .firms_api_key
                .clone()
                .unwrap_or_else(|| "DEMO_KEY".to_string()),
            firms_source: self
                .firms_source
                .clone()
                .unwrap_or_else(|| "VIIRS_NOAA20_NRT".to_string()),
        }
    }

    /// Values given on the command line or in the environment win over the file
    pub fn merge(self, file_config: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(file_config.level),
            language: self.language.or(file_config.language),
            timezone: self.timezone.or(file_config.timezone),
            forecast_days: self.forecast_days.or(file_config.forecast_days),
            history_days: self.history_days.or(file_config.history_days),
            precipitation_threshold: self
                .precipitation_threshold
                .or(file_config.precipitation_threshold),
            wind_threshold: self.wind_threshold.or(file_config.wind_threshold),
            heat_threshold: self.heat_threshold.or(file_config.heat_threshold),
            cold_threshold: self.cold_threshold.or(file_config.cold_threshold),
            wave_days: self.wave_days.or(file_config.wave_days),
            firms_api_key: self.firms_api_key.or(file_config.firms_api_key),
            firms_source: self.firms_source.or(file_config.firms_source),
            fire_radius_km: self.fire_radius_km.or(file_config.fire_radius_km),
            fire_days_back: self.fire_days_back.or(file_config.fire_days_back),
            maps_api_key: self.maps_api_key.or(file_config.maps_api_key),
            reports_dir: self.reports_dir.or(file_config.reports_dir),
            user_agent: self.user_agent.or(file_config.user_agent),
            refill_rate: self.refill_rate.or(file_config.refill_rate),
            token_capacity: self.token_capacity.or(file_config.token_capacity),
            max_retries: self.max_retries.or(file_config.max_retries),
            timeout: self.timeout.or(file_config.timeout),
            cache_ttl: self.cache_ttl.or(file_config.cache_ttl),
            watch_interval: self.watch_interval.or(file_config.watch_interval),
            geocoding_url: self.geocoding_url.or(file_config.geocoding_url),
            forecast_url: self.forecast_url.or(file_config.forecast_url),
            archive_url: self.archive_url.or(file_config.archive_url),
            air_quality_url: self.air_quality_url.or(file_config.air_quality_url),
            firms_url: self.firms_url.or(file_config.firms_url),
            command: self.command,
        }
    }
}

/// Load configuration from CLI args, config file, and environment.
///
/// The third value is the error of a discovered config file that was skipped.
pub fn get_config_info() -> anyhow::Result<(Cli, ConfigSource, Option<anyhow::Error>)> {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file(CONFIG_ENV_VAR, CONFIG_FILE_NAME)
    };

    let (cli, skipped) = merge_config_file(cli_args, &source)?;
    Ok((cli, source, skipped))
}

/// Layer `cli_args` over the file at `source`. A file that was asked for by
/// path must load, a discovered one that fails is skipped and its error returned.
pub fn merge_config_file(
    cli_args: Cli,
    source: &ConfigSource,
) -> anyhow::Result<(Cli, Option<anyhow::Error>)> {
    match load_config::<Cli>(source) {
        Ok(file_config) => Ok((cli_args.merge(file_config), None)),
        Err(err) if matches!(source, ConfigSource::Explicit(_)) => Err(err),
        Err(err) => Ok((cli_args.merge(Cli::default()), Some(err))),
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" | "warning" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

pub fn setup_logger(cli: &Cli) -> Logger {
    let log_level = match cli.level.as_ref() {
        Some(level) => parse_level(level),
        None => parse_level(&env::var("RUST_LOG").unwrap_or_default()),
    };

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}
