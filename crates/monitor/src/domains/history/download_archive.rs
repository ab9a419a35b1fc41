use reqwest::Url;
use serde::Deserialize;
use slog::{info, Logger};
use std::sync::Arc;
use time::{Date, Duration};

use crate::{build_url, format_date, City, DailyData, DailySeries, Error, HttpFetcher};

pub const ARCHIVE_DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max,wind_direction_10m_dominant";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryWindow {
    pub start: Date,
    pub end: Date,
}

impl HistoryWindow {
    /// The `days` days leading up to and including `today`
    pub fn ending(today: Date, days: u32) -> Result<Self, Error> {
        let start = today
            .checked_sub(Duration::days(i64::from(days)))
            .ok_or(Error::InvalidWindow { days })?;
        Ok(HistoryWindow { start, end: today })
    }
}

#[derive(Debug, Deserialize)]
pub struct ArchiveResponse {
    #[serde(default)]
    pub daily: Option<DailyData>,
}

pub fn archive_url(base_url: &str, city: &City, window: HistoryWindow) -> Result<Url, Error> {
    build_url(
        base_url,
        "/v1/archive",
        &[
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("start_date", format_date(window.start)),
            ("end_date", format_date(window.end)),
            ("daily", ARCHIVE_DAILY_VARIABLES.to_string()),
            ("timezone", String::from("auto")),
        ],
    )
}

pub struct ArchiveService {
    pub logger: Logger,
    pub fetcher: Arc<HttpFetcher>,
    base_url: String,
}

impl ArchiveService {
    pub fn new(logger: Logger, fetcher: Arc<HttpFetcher>, base_url: String) -> Self {
        ArchiveService {
            logger,
            fetcher,
            base_url,
        }
    }

    pub async fn get_daily_history(
        &self,
        city: &City,
        window: HistoryWindow,
    ) -> Result<DailySeries, Error> {
        let url = archive_url(&self.base_url, city, window)?;
        info!(
            self.logger,
            "fetching history for {} from {} to {}", city.name, window.start, window.end
        );
        let response: ArchiveResponse = self.fetcher.fetch_json(url).await?;
        match response.daily {
            Some(daily) => DailySeries::try_from(&daily),
            None => Ok(DailySeries::default()),
        }
    }
}
