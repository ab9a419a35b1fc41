use async_trait::async_trait;
use slog::Logger;
use std::sync::Arc;
use time::Date;

use crate::{
    AirQuality, AirQualityService, ArchiveService, City, DailySeries, Endpoints, Error,
    FireHotspot, FireQuery, FireService, Forecast, ForecastService, GeocodingService,
    HistoryWindow, HttpFetcher,
};

/// Everything the monitor needs from the outside world
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Candidate locations for a place name, exact name matches preferred
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

/// Open-Meteo for weather and air quality, NASA FIRMS for fires
pub struct RemoteWeather {
    geocoding: GeocodingService,
    forecasts: ForecastService,
    history: ArchiveService,
    air: AirQualityService,
    fires: FireService,
}

impl RemoteWeather {
    pub fn new(logger: Logger, fetcher: Arc<HttpFetcher>, endpoints: Endpoints) -> Self {
        RemoteWeather {
            geocoding: GeocodingService::new(
                logger.clone(),
                fetcher.clone(),
                endpoints.geocoding_url,
                endpoints.language,
            ),
            forecasts: ForecastService::new(
                logger.clone(),
                fetcher.clone(),
                endpoints.forecast_url,
                endpoints.timezone,
            ),
            history: ArchiveService::new(logger.clone(), fetcher.clone(), endpoints.archive_url),
            air: AirQualityService::new(logger.clone(), fetcher.clone(), endpoints.air_quality_url),
            fires: FireService::new(
                logger,
                fetcher,
                endpoints.firms_url,
                endpoints.firms_api_key,
                endpoints.firms_source,
            ),
        }
    }
}

#[async_trait]
impl WeatherApi for RemoteWeather {
    async fn search_cities(&self, name: &str) -> Result<Vec<City>, Error> {
        self.geocoding.search(name).await
    }

    async fn forecast(&self, city: &City, days: u8) -> Result<Forecast, Error> {
        self.forecasts.get_forecast(city, days).await
    }

    async fn daily_history(&self, city: &City, window: HistoryWindow) -> Result<DailySeries, Error> {
        self.history.get_daily_history(city, window).await
    }

    async fn air_quality(&self, city: &City) -> Result<AirQuality, Error> {
        self.air.get_air_quality(city).await
    }

    async fn fire_hotspots(
        &self,
        city: &City,
        query: &FireQuery,
        today: Date,
    ) -> Result<Vec<FireHotspot>, Error> {
        self.fires.get_hotspots(city, query, today).await
    }
}
