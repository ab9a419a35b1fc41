//! Column oriented API payloads and the row series built from them.
//!
//! The forecast and archive endpoints answer with one array per variable,
//! each entry nullable. Rows are rebuilt here so the rest of the crate works
//! on one record per day or hour. An array that is missing or shorter than
//! `time` simply yields `None` for the affected rows.

use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, PrimitiveDateTime};

use crate::Error;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DailyData {
    pub time: Vec<String>,
    #[serde(default)]
    pub weather_code: Vec<Option<u8>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_10m_dominant: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HourlyData {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<u8>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_direction_10m: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: Date,
    pub weather_code: Option<u8>,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub wind_direction_dominant: Option<f64>,
}

impl DailyRecord {
    /// A day with only its date set
    pub fn empty(date: Date) -> Self {
        DailyRecord {
            date,
            weather_code: None,
            temperature_max: None,
            temperature_min: None,
            precipitation_sum: None,
            wind_speed_max: None,
            wind_direction_dominant: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRecord {
    pub time: PrimitiveDateTime,
    pub temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<u8>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    pub days: Vec<DailyRecord>,
}

impl DailySeries {
    pub fn new(days: Vec<DailyRecord>) -> Self {
        DailySeries { days }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyRecord> {
        self.days.iter()
    }

    /// The leading `n` days, used for the weekly view and its alerts
    pub fn first_days(&self, n: usize) -> DailySeries {
        DailySeries {
            days: self.days.iter().take(n).cloned().collect(),
        }
    }

    pub fn max_precipitation(&self) -> Option<&DailyRecord> {
        max_by_value(&self.days, |d| d.precipitation_sum)
    }

    pub fn max_wind(&self) -> Option<&DailyRecord> {
        max_by_value(&self.days, |d| d.wind_speed_max)
    }

    pub fn hottest(&self) -> Option<&DailyRecord> {
        max_by_value(&self.days, |d| d.temperature_max)
    }

    pub fn coldest(&self) -> Option<&DailyRecord> {
        max_by_value(&self.days, |d| d.temperature_min.map(|t| -t))
    }
}

fn max_by_value<F>(days: &[DailyRecord], value: F) -> Option<&DailyRecord>
where
    F: Fn(&DailyRecord) -> Option<f64>,
{
    days.iter()
        .filter_map(|d| value(d).map(|v| (d, v)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(d, _)| d)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    pub hours: Vec<HourlyRecord>,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Every `step`-th hour starting at the first one
    pub fn sampled(&self, step: usize) -> impl Iterator<Item = &HourlyRecord> {
        self.hours.iter().step_by(step.max(1))
    }
}

fn at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

pub fn parse_date(value: &str) -> Result<Date, Error> {
    Ok(Date::parse(value, format_description!("[year]-[month]-[day]"))?)
}

pub fn parse_hour(value: &str) -> Result<PrimitiveDateTime, Error> {
    Ok(PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    )?)
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_hour(time: PrimitiveDateTime) -> String {
    time.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| time.to_string())
}

impl TryFrom<&DailyData> for DailySeries {
    type Error = Error;
    fn try_from(val: &DailyData) -> Result<Self, Self::Error> {
        let days = val
            .time
            .iter()
            .enumerate()
            .map(|(i, day)| {
                Ok(DailyRecord {
                    date: parse_date(day)?,
                    weather_code: at(&val.weather_code, i),
                    temperature_max: at(&val.temperature_2m_max, i),
                    temperature_min: at(&val.temperature_2m_min, i),
                    precipitation_sum: at(&val.precipitation_sum, i),
                    wind_speed_max: at(&val.wind_speed_10m_max, i),
                    wind_direction_dominant: at(&val.wind_direction_10m_dominant, i),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(DailySeries { days })
    }
}

impl TryFrom<&HourlyData> for HourlySeries {
    type Error = Error;
    fn try_from(val: &HourlyData) -> Result<Self, Self::Error> {
        let hours = val
            .time
            .iter()
            .enumerate()
            .map(|(i, hour)| {
                Ok(HourlyRecord {
                    time: parse_hour(hour)?,
                    temperature: at(&val.temperature_2m, i),
                    relative_humidity: at(&val.relative_humidity_2m, i),
                    precipitation: at(&val.precipitation, i),
                    weather_code: at(&val.weather_code, i),
                    wind_speed: at(&val.wind_speed_10m, i),
                    wind_direction: at(&val.wind_direction_10m, i),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(HourlySeries { hours })
    }
}
