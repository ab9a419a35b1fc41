use reqwest::Url;
use serde::{Deserialize, Serialize};
use slog::{debug, info, Logger};
use std::sync::Arc;

use crate::{build_url, Error, HttpFetcher};

/// Candidates requested per search
pub const SEARCH_RESULT_COUNT: u8 = 20;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl City {
    /// A location picked by coordinates rather than by name
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        City {
            name: String::from("Current location"),
            latitude,
            longitude,
            admin1: None,
            country: None,
            timezone: None,
        }
    }

    /// "Name, Region, Country (Lat: 00.00, Lon: 00.00)"
    pub fn label(&self) -> String {
        format!(
            "{}, {}, {} (Lat: {:.2}, Lon: {:.2})",
            self.name,
            self.admin1.as_deref().unwrap_or_default(),
            self.country.as_deref().unwrap_or_default(),
            self.latitude,
            self.longitude
        )
    }

    /// "Name, Region" as printed on reports
    pub fn place(&self) -> String {
        match self.admin1.as_deref() {
            Some(admin1) if !admin1.is_empty() => format!("{}, {}", self.name, admin1),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Option<Vec<City>>,
}

/// Keep the exact (case-insensitive) name matches, or everything when none match.
pub fn filter_exact_matches(name: &str, results: Vec<City>) -> Vec<City> {
    let wanted = name.trim().to_lowercase();
    let exact: Vec<City> = results
        .iter()
        .filter(|city| city.name.to_lowercase() == wanted)
        .cloned()
        .collect();
    if exact.is_empty() {
        results
    } else {
        exact
    }
}

pub fn search_url(base_url: &str, name: &str, language: &str) -> Result<Url, Error> {
    build_url(
        base_url,
        "/v1/search",
        &[
            ("name", name.trim().to_lowercase()),
            ("count", SEARCH_RESULT_COUNT.to_string()),
            ("language", language.to_string()),
        ],
    )
}

pub struct GeocodingService {
    pub logger: Logger,
    pub fetcher: Arc<HttpFetcher>,
    base_url: String,
    language: String,
}

impl GeocodingService {
    pub fn new(logger: Logger, fetcher: Arc<HttpFetcher>, base_url: String, language: String) -> Self {
        GeocodingService {
            logger,
            fetcher,
            base_url,
            language,
        }
    }

    pub async fn search(&self, name: &str) -> Result<Vec<City>, Error> {
        let url = search_url(&self.base_url, name, &self.language)?;
        info!(self.logger, "searching locations named '{}'", name);
        let response: GeocodingResponse = self.fetcher.fetch_json(url).await?;
        let results = response.results.unwrap_or_default();
        debug!(self.logger, "geocoding returned {} candidates", results.len());
        Ok(filter_exact_matches(name, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str, admin1: &str) -> City {
        City {
            name: name.to_string(),
            latitude: -23.5475,
            longitude: -46.63611,
            admin1: Some(admin1.to_string()),
            country: Some(String::from("Brazil")),
            timezone: Some(String::from("America/Sao_Paulo")),
        }
    }

    #[test]
    fn keeps_only_exact_matches() {
        let results = vec![
            city("Campinas", "São Paulo"),
            city("Campinas do Sul", "Rio Grande do Sul"),
            city("CAMPINAS", "Goiás"),
        ];
        let filtered = filter_exact_matches("campinas", results);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|c| c.name.eq_ignore_ascii_case("campinas")));
    }

    #[test]
    fn falls_back_to_all_results() {
        let results = vec![city("Campinas do Sul", "Rio Grande do Sul")];
        let filtered = filter_exact_matches("campinas", results.clone());
        assert_eq!(filtered, results);
    }

    #[test]
    fn search_request() {
        let url = search_url("https://geocoding-api.open-meteo.com", " Porto Alegre ", "pt").unwrap();
        assert_eq!(
            url.as_str(),
            "https://geocoding-api.open-meteo.com/v1/search?name=porto+alegre&count=20&language=pt"
        );
    }

    #[test]
    fn decodes_response_without_results() {
        let response: GeocodingResponse = serde_json::from_str(r#"{"generationtime_ms": 0.5}"#).unwrap();
        assert!(response.results.is_none());
    }

    #[test]
    fn decodes_sparse_city() {
        let response: GeocodingResponse = serde_json::from_str(
            r#"{"results": [{"id": 1, "name": "Lisbon", "latitude": 38.71667, "longitude": -9.13333, "country": "Portugal"}]}"#,
        )
        .unwrap();
        let cities = response.results.unwrap();
        assert_eq!(cities[0].admin1, None);
        assert_eq!(cities[0].label(), "Lisbon, , Portugal (Lat: 38.72, Lon: -9.13)");
        assert_eq!(cities[0].place(), "Lisbon");
    }

    #[test]
    fn labels_and_places() {
        let c = city("São Paulo", "São Paulo");
        assert_eq!(c.label(), "São Paulo, São Paulo, Brazil (Lat: -23.55, Lon: -46.64)");
        assert_eq!(c.place(), "São Paulo, São Paulo");
        assert_eq!(City::from_coordinates(1.0, 2.0).name, "Current location");
    }
}
