use async_trait::async_trait;
use mockall::mock;
use slog::{o, Discard, Logger};
use std::sync::Arc;
use time::{macros::date, Date};
use weather_monitor::{
    AirQuality, City, Cli, DailyRecord, DailySeries, Error, FireHotspot, FireQuery, Forecast,
    HistoryWindow, Monitor, WeatherApi,
};

mock! {
    pub WeatherAccess {}

    #[async_trait]
    impl WeatherApi for WeatherAccess {
        async fn search_cities(&self, name: &str) -> Result<Vec<City>, Error>;
        async fn forecast(&self, city: &City, days: u8) -> Result<Forecast, Error>;
        async fn daily_history(&self, city: &City, window: HistoryWindow) -> Result<DailySeries, Error>;
        async fn air_quality(&self, city: &City) -> Result<AirQuality, Error>;
        async fn fire_hotspots(
            &self,
            city: &City,
            query: &FireQuery,
            today: Date,
        ) -> Result<Vec<FireHotspot>, Error>;
    }
}

/// Every monitor in these tests runs on this day
pub const TODAY: Date = date!(2024 - 05 - 10);

pub fn spawn_monitor(weather: MockWeatherAccess, cli: Cli) -> Monitor {
    let logger = Logger::root(Discard, o!());
    Monitor::new(logger, Arc::new(weather), cli).at_date(TODAY)
}

pub fn city(name: &str, latitude: f64, longitude: f64) -> City {
    City {
        name: name.to_string(),
        latitude,
        longitude,
        admin1: Some(String::from("Rio Grande do Sul")),
        country: Some(String::from("Brazil")),
        timezone: Some(String::from("America/Sao_Paulo")),
    }
}

pub fn porto_alegre() -> City {
    city("Porto Alegre", -30.0331, -51.23)
}

/// Mild days starting at `start`, one per entry, with the given precipitation
pub fn rainy_days(start: Date, precipitation: &[f64]) -> DailySeries {
    let days = precipitation
        .iter()
        .enumerate()
        .map(|(i, mm)| DailyRecord {
            weather_code: Some(61),
            temperature_max: Some(24.0),
            temperature_min: Some(16.0),
            precipitation_sum: Some(*mm),
            wind_speed_max: Some(20.0),
            wind_direction_dominant: Some(90.0),
            ..DailyRecord::empty(start + time::Duration::days(i as i64))
        })
        .collect();
    DailySeries::new(days)
}

/// Days with the given daily maximum temperatures
pub fn hot_days(start: Date, maximums: &[f64]) -> DailySeries {
    let days = maximums
        .iter()
        .enumerate()
        .map(|(i, max)| DailyRecord {
            temperature_max: Some(*max),
            temperature_min: Some(22.0),
            precipitation_sum: Some(0.0),
            wind_speed_max: Some(10.0),
            ..DailyRecord::empty(start + time::Duration::days(i as i64))
        })
        .collect();
    DailySeries::new(days)
}
