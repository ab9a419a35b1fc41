use reqwest::Url;
use serde::Deserialize;
use slog::{debug, info, Logger};
use std::{f64::consts::PI, fmt, sync::Arc};
use time::{Date, Duration};

use crate::{build_url, format_date, City, Error, HttpFetcher};

/// Kilometres per degree of latitude, used for the search box
pub const KM_PER_DEGREE: f64 = 111.32;

/// The area API serves at most this many days per request
pub const MAX_DAY_RANGE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireQuery {
    pub radius_km: f64,
    pub days_back: u32,
}

impl Default for FireQuery {
    fn default() -> Self {
        FireQuery {
            radius_km: 100.0,
            days_back: 7,
        }
    }
}

impl FireQuery {
    pub fn day_range(&self) -> u32 {
        self.days_back.clamp(1, MAX_DAY_RANGE)
    }

    /// First day of the query window, so that the window ends today
    pub fn start_date(&self, today: Date) -> Date {
        today - Duration::days(i64::from(self.day_range()) - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Square box of `radius_km` around a point, one degree taken as 111.32 km
    pub fn around(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        let delta = radius_km / KM_PER_DEGREE;
        BoundingBox {
            west: (longitude - delta).max(-180.0),
            south: (latitude - delta).max(-90.0),
            east: (longitude + delta).min(180.0),
            north: (latitude + delta).min(90.0),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4},{:.4},{:.4},{:.4}",
            self.west, self.south, self.east, self.north
        )
    }
}

#[derive(Debug, Deserialize)]
struct FirmsRow {
    latitude: f64,
    longitude: f64,
    acq_date: String,
    #[serde(default)]
    acq_time: String,
    #[serde(default)]
    confidence: String,
    #[serde(default)]
    frp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireHotspot {
    pub latitude: f64,
    pub longitude: f64,
    pub acq_date: String,
    pub acq_time: String,
    /// "l"/"n"/"h" for VIIRS, a percentage for MODIS
    pub confidence: String,
    /// fire radiative power, MW
    pub frp: Option<f64>,
    pub distance_km: f64,
}

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const R: f64 = 6371.0; // Earth radius in km

    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let dlat = (lat2 - lat1) * PI / 180.0;
    let dlon = (lon2 - lon1) * PI / 180.0;

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    R * c
}

/// Decode the area CSV, nearest hotspot first.
///
/// An empty body means nothing was detected. Anything that doesn't start
/// with a csv header is the API telling us about a bad key or request.
pub fn parse_firms_csv(body: &str, origin: &City) -> Result<Vec<FireHotspot>, Error> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }
    let header = trimmed.lines().next().unwrap_or_default();
    if !header.split(',').any(|column| column.trim() == "latitude") {
        return Err(Error::UnexpectedResponse {
            source_name: String::from("FIRMS"),
            body: header.chars().take(200).collect(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(trimmed.as_bytes());

    let mut hotspots = vec![];
    for row in reader.deserialize() {
        let row: FirmsRow = row?;
        hotspots.push(FireHotspot {
            distance_km: haversine_km(origin.latitude, origin.longitude, row.latitude, row.longitude),
            latitude: row.latitude,
            longitude: row.longitude,
            acq_date: row.acq_date,
            acq_time: row.acq_time,
            confidence: row.confidence,
            frp: row.frp,
        });
    }
    hotspots.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    Ok(hotspots)
}

/// `/api/area/csv/{key}/{source}/{west,south,east,north}/{day range}/{start date}`
pub fn fire_area_url(
    base_url: &str,
    api_key: &str,
    source: &str,
    city: &City,
    query: &FireQuery,
    today: Date,
) -> Result<Url, Error> {
    let area = BoundingBox::around(city.latitude, city.longitude, query.radius_km);
    let path = format!(
        "/api/area/csv/{}/{}/{}/{}/{}",
        api_key,
        source,
        area,
        query.day_range(),
        format_date(query.start_date(today))
    );
    build_url(base_url, &path, &[])
}

pub struct FireService {
    pub logger: Logger,
    pub fetcher: Arc<HttpFetcher>,
    base_url: String,
    api_key: String,
    source: String,
}

impl FireService {
    pub fn new(
        logger: Logger,
        fetcher: Arc<HttpFetcher>,
        base_url: String,
        api_key: String,
        source: String,
    ) -> Self {
        FireService {
            logger,
            fetcher,
            base_url,
            api_key,
            source,
        }
    }

    pub async fn get_hotspots(
        &self,
        city: &City,
        query: &FireQuery,
        today: Date,
    ) -> Result<Vec<FireHotspot>, Error> {
        let url = fire_area_url(&self.base_url, &self.api_key, &self.source, city, query, today)?;
        info!(
            self.logger,
            "fetching fire hotspots within {} km of {}", query.radius_km, city.name
        );
        let body = self.fetcher.fetch_text(url).await?;
        let hotspots = parse_firms_csv(&body, city)?;
        debug!(self.logger, "found {} hotspots", hotspots.len());
        Ok(hotspots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn brasilia() -> City {
        City {
            name: String::from("Brasília"),
            latitude: -15.7797,
            longitude: -47.9297,
            admin1: Some(String::from("Federal District")),
            country: Some(String::from("Brazil")),
            timezone: None,
        }
    }

    const VIIRS_CSV: &str = "latitude,longitude,bright_ti4,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_ti5,frp,daynight\n\
-15.9,-48.1,330.5,0.39,0.36,2024-08-20,1642,N20,VIIRS,n,2.0NRT,295.1,4.2,D\n\
-15.78,-47.93,345.1,0.41,0.37,2024-08-21,448,N20,VIIRS,h,2.0NRT,290.0,,N\n";

    #[test]
    fn box_spans_radius_in_degrees() {
        let area = BoundingBox::around(-15.0, -47.0, 111.32);
        assert_eq!(area.to_string(), "-48.0000,-16.0000,-46.0000,-14.0000");
    }

    #[test]
    fn box_is_clamped_to_globe() {
        let area = BoundingBox::around(89.5, 179.5, 222.64);
        assert_eq!(area.north, 90.0);
        assert_eq!(area.east, 180.0);
    }

    #[test]
    fn query_window_ends_today() {
        let query = FireQuery::default();
        assert_eq!(query.day_range(), 7);
        assert_eq!(query.start_date(date!(2024 - 08 - 21)), date!(2024 - 08 - 15));

        let query = FireQuery {
            days_back: 30,
            ..FireQuery::default()
        };
        assert_eq!(query.day_range(), MAX_DAY_RANGE);
    }

    #[test]
    fn area_request() {
        let city = City::from_coordinates(-15.0, -47.0);
        let query = FireQuery {
            radius_km: 111.32,
            days_back: 3,
        };
        let url = fire_area_url(
            "https://firms.modaps.eosdis.nasa.gov",
            "abc123",
            "VIIRS_NOAA20_NRT",
            &city,
            &query,
            date!(2024 - 08 - 21),
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://firms.modaps.eosdis.nasa.gov/api/area/csv/abc123/VIIRS_NOAA20_NRT/-48.0000,-16.0000,-46.0000,-14.0000/3/2024-08-19"
        );
        assert_eq!(url.query(), None);
    }

    #[test]
    fn parses_viirs_rows_nearest_first() {
        let hotspots = parse_firms_csv(VIIRS_CSV, &brasilia()).unwrap();

        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].acq_date, "2024-08-21");
        assert_eq!(hotspots[0].confidence, "h");
        assert_eq!(hotspots[0].frp, None);
        assert!(hotspots[0].distance_km < 1.0);
        assert_eq!(hotspots[1].acq_time, "1642");
        assert_eq!(hotspots[1].frp, Some(4.2));
        assert!(hotspots[1].distance_km > hotspots[0].distance_km);
    }

    #[test]
    fn empty_body_has_no_hotspots() {
        assert!(parse_firms_csv("  \n", &brasilia()).unwrap().is_empty());
    }

    #[test]
    fn header_only_has_no_hotspots() {
        let body = "latitude,longitude,acq_date,confidence\n";
        assert!(parse_firms_csv(body, &brasilia()).unwrap().is_empty());
    }

    #[test]
    fn error_text_is_rejected() {
        let err = parse_firms_csv("Invalid MAP_KEY.", &brasilia()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
        assert!(err.to_string().contains("Invalid MAP_KEY."));
    }

    #[test]
    fn haversine_distances() {
        // Rio de Janeiro to São Paulo: ~360 km
        let dist = haversine_km(-22.9068, -43.1729, -23.5505, -46.6333);
        assert!((dist - 360.0).abs() < 15.0);

        assert!(haversine_km(10.0, 10.0, 10.0, 10.0).abs() < 0.001);
    }
}
