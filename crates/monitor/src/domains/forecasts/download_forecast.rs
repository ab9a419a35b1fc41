use reqwest::Url;
use serde::{Deserialize, Serialize};
use slog::{debug, info, Logger};
use std::sync::Arc;
use weather_monitor_core::MAX_FORECAST_DAYS;

use crate::{build_url, City, DailyData, DailySeries, Error, HourlyData, HourlySeries, HttpFetcher};

/*
Variables requested from the forecast endpoint, see
https://open-meteo.com/en/docs

current  temperature, humidity, feels like, precipitation, condition, wind
hourly   temperature, humidity, precipitation, condition, wind
daily    condition, max/min temperature, precipitation sum, max wind, dominant direction
*/
pub const CURRENT_VARIABLES: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,weather_code,wind_speed_10m,wind_direction_10m";
pub const HOURLY_VARIABLES: &str =
    "temperature_2m,relative_humidity_2m,precipitation,weather_code,wind_speed_10m,wind_direction_10m";
pub const DAILY_VARIABLES: &str = "weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max,wind_direction_10m_dominant";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<u8>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub current: Option<CurrentConditions>,
    #[serde(default)]
    pub hourly: Option<HourlyData>,
    #[serde(default)]
    pub daily: Option<DailyData>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub current: Option<CurrentConditions>,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

impl TryFrom<ForecastResponse> for Forecast {
    type Error = Error;
    fn try_from(val: ForecastResponse) -> Result<Self, Self::Error> {
        Ok(Forecast {
            latitude: val.latitude,
            longitude: val.longitude,
            timezone: val.timezone.unwrap_or_else(|| String::from("GMT")),
            current: val.current,
            hourly: val
                .hourly
                .as_ref()
                .map(HourlySeries::try_from)
                .transpose()?
                .unwrap_or_default(),
            daily: val
                .daily
                .as_ref()
                .map(DailySeries::try_from)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Forecast horizon accepted by the API
pub fn clamp_forecast_days(days: u8) -> u8 {
    days.clamp(1, MAX_FORECAST_DAYS)
}

/// Request for `days` days, in the city's timezone or else `default_timezone`
pub fn forecast_url(
    base_url: &str,
    city: &City,
    default_timezone: &str,
    days: u8,
) -> Result<Url, Error> {
    let timezone = city
        .timezone
        .clone()
        .unwrap_or_else(|| default_timezone.to_string());
    build_url(
        base_url,
        "/v1/forecast",
        &[
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("current", CURRENT_VARIABLES.to_string()),
            ("hourly", HOURLY_VARIABLES.to_string()),
            ("daily", DAILY_VARIABLES.to_string()),
            ("timezone", timezone),
            ("forecast_days", clamp_forecast_days(days).to_string()),
        ],
    )
}

pub struct ForecastService {
    pub logger: Logger,
    pub fetcher: Arc<HttpFetcher>,
    base_url: String,
    default_timezone: String,
}

impl ForecastService {
    pub fn new(
        logger: Logger,
        fetcher: Arc<HttpFetcher>,
        base_url: String,
        default_timezone: String,
    ) -> Self {
        ForecastService {
            logger,
            fetcher,
            base_url,
            default_timezone,
        }
    }

    pub async fn get_forecast(&self, city: &City, days: u8) -> Result<Forecast, Error> {
        let days = clamp_forecast_days(days);
        let url = forecast_url(&self.base_url, city, &self.default_timezone, days)?;
        info!(self.logger, "fetching {} day forecast for {}", days, city.name);
        let response: ForecastResponse = self.fetcher.fetch_json(url).await?;
        let forecast = Forecast::try_from(response)?;
        debug!(
            self.logger,
            "forecast has {} days, {} hours",
            forecast.daily.len(),
            forecast.hourly.len()
        );
        Ok(forecast)
    }
}
