use reqwest::Url;
use serde::Deserialize;
use slog::{info, Logger};
use std::{fmt, sync::Arc};
use time::PrimitiveDateTime;

use crate::{build_url, parse_hour, City, Error, HttpFetcher};

pub const AIR_CURRENT_VARIABLES: &str =
    "pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,ozone,european_aqi,us_aqi";
pub const AIR_HOURLY_VARIABLES: &str = "pm10,pm2_5";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AirQualityCurrent {
    pub time: String,
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
    pub carbon_monoxide: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
    pub ozone: Option<f64>,
    pub european_aqi: Option<f64>,
    pub us_aqi: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirQualityHourly {
    pub time: Vec<String>,
    #[serde(default)]
    pub pm10: Vec<Option<f64>>,
    #[serde(default)]
    pub pm2_5: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AirQualityResponse {
    #[serde(default)]
    pub current: Option<AirQualityCurrent>,
    #[serde(default)]
    pub hourly: Option<AirQualityHourly>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityHour {
    pub time: PrimitiveDateTime,
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirQuality {
    pub current: Option<AirQualityCurrent>,
    pub hourly: Vec<AirQualityHour>,
}

impl AirQuality {
    /// Hour with the highest fine particulate reading
    pub fn peak_pm2_5(&self) -> Option<&AirQualityHour> {
        self.hourly
            .iter()
            .filter(|h| h.pm2_5.is_some())
            .max_by(|a, b| a.pm2_5.unwrap_or_default().total_cmp(&b.pm2_5.unwrap_or_default()))
    }

    pub fn band(&self) -> Option<AqiBand> {
        self.current
            .as_ref()
            .and_then(|c| c.european_aqi)
            .map(AqiBand::from_european)
    }
}

impl TryFrom<AirQualityResponse> for AirQuality {
    type Error = Error;
    fn try_from(val: AirQualityResponse) -> Result<Self, Self::Error> {
        let hourly = match val.hourly {
            Some(hourly) => hourly
                .time
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    Ok(AirQualityHour {
                        time: parse_hour(t)?,
                        pm10: hourly.pm10.get(i).copied().flatten(),
                        pm2_5: hourly.pm2_5.get(i).copied().flatten(),
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?,
            None => vec![],
        };
        Ok(AirQuality {
            current: val.current,
            hourly,
        })
    }
}

/// European Air Quality Index bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiBand {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    ExtremelyPoor,
}

impl AqiBand {
    pub fn from_european(aqi: f64) -> Self {
        match aqi {
            v if v < 20.0 => AqiBand::Good,
            v if v < 40.0 => AqiBand::Fair,
            v if v < 60.0 => AqiBand::Moderate,
            v if v < 80.0 => AqiBand::Poor,
            v if v <= 100.0 => AqiBand::VeryPoor,
            _ => AqiBand::ExtremelyPoor,
        }
    }
}

impl fmt::Display for AqiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AqiBand::Good => "Good",
            AqiBand::Fair => "Fair",
            AqiBand::Moderate => "Moderate",
            AqiBand::Poor => "Poor",
            AqiBand::VeryPoor => "Very poor",
            AqiBand::ExtremelyPoor => "Extremely poor",
        };
        write!(f, "{}", label)
    }
}

pub fn air_quality_url(base_url: &str, city: &City) -> Result<Url, Error> {
    build_url(
        base_url,
        "/v1/air-quality",
        &[
            ("latitude", city.latitude.to_string()),
            ("longitude", city.longitude.to_string()),
            ("current", AIR_CURRENT_VARIABLES.to_string()),
            ("hourly", AIR_HOURLY_VARIABLES.to_string()),
            ("forecast_days", String::from("1")),
            ("timezone", String::from("auto")),
        ],
    )
}

pub struct AirQualityService {
    pub logger: Logger,
    pub fetcher: Arc<HttpFetcher>,
    base_url: String,
}

impl AirQualityService {
    pub fn new(logger: Logger, fetcher: Arc<HttpFetcher>, base_url: String) -> Self {
        AirQualityService {
            logger,
            fetcher,
            base_url,
        }
    }

    pub async fn get_air_quality(&self, city: &City) -> Result<AirQuality, Error> {
        let url = air_quality_url(&self.base_url, city)?;
        info!(self.logger, "fetching air quality for {}", city.name);
        let response: AirQualityResponse = self.fetcher.fetch_json(url).await?;
        AirQuality::try_from(response)
    }
}
