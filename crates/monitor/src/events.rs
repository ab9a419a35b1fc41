//! Rule based scan for extreme weather days.
//!
//! Every day is checked against four rules:
//! - daily precipitation above the precipitation threshold
//! - daily maximum wind above the wind threshold
//! - a heat wave: `wave_days` consecutive days with a maximum at or above the heat threshold
//! - a cold wave: `wave_days` consecutive days with a minimum at or below the cold threshold
//!
//! A missing reading counts as 0, so a run of missing daily minimums reads
//! as a cold wave and a missing maximum breaks a heat wave.

use std::fmt;

use time::Date;

use crate::{format_date, DailySeries};

/// Days covered by the alerts shown with a forecast
pub const ALERT_HORIZON_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// mm per day, strictly greater triggers
    pub precipitation_mm: f64,
    /// km/h, strictly greater triggers
    pub wind_kmh: f64,
    /// °C daily maximum, greater or equal on every day of the run
    pub heat_c: f64,
    /// °C daily minimum, less or equal on every day of the run
    pub cold_c: f64,
    /// length of a heat or cold wave run
    pub wave_days: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            precipitation_mm: 50.0,
            wind_kmh: 60.0,
            heat_c: 35.0,
            cold_c: 5.0,
            wave_days: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ExtremePrecipitation { mm: f64 },
    WindGust { kmh: f64, direction: Option<f64> },
    HeatWave,
    ColdWave,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::ExtremePrecipitation { mm } => write!(f, "Extreme precipitation: {} mm", mm),
            EventKind::WindGust {
                kmh,
                direction: Some(direction),
            } => write!(f, "Wind gust: {} km/h, direction {}°", kmh, direction),
            EventKind::WindGust {
                kmh,
                direction: None,
            } => write!(f, "Wind gust: {} km/h", kmh),
            EventKind::HeatWave => write!(f, "Heat wave detected"),
            EventKind::ColdWave => write!(f, "Cold wave detected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtremeEvent {
    pub date: Date,
    pub kinds: Vec<EventKind>,
}

impl ExtremeEvent {
    pub fn summary(&self) -> String {
        let kinds: Vec<String> = self.kinds.iter().map(|k| k.to_string()).collect();
        format!("{}: {}", format_date(self.date), kinds.join(", "))
    }
}

/// Flag every day of `series` that breaks one of the `thresholds`.
///
/// Days come back in input order, flags within a day in rule order
/// (precipitation, wind, heat, cold). Days without a flag are left out.
pub fn detect_extreme_events(series: &DailySeries, thresholds: &Thresholds) -> Vec<ExtremeEvent> {
    let days = &series.days;
    let window = thresholds.wave_days.max(1);
    let mut events = vec![];

    for (i, day) in days.iter().enumerate() {
        let mut kinds = vec![];

        let mm = reading(day.precipitation_sum);
        if mm > thresholds.precipitation_mm {
            kinds.push(EventKind::ExtremePrecipitation { mm });
        }

        let kmh = reading(day.wind_speed_max);
        if kmh > thresholds.wind_kmh {
            kinds.push(EventKind::WindGust {
                kmh,
                direction: day.wind_direction_dominant,
            });
        }

        if i + 1 >= window {
            let run = &days[i + 1 - window..=i];
            if run
                .iter()
                .all(|d| reading(d.temperature_max) >= thresholds.heat_c)
            {
                kinds.push(EventKind::HeatWave);
            }
            if run
                .iter()
                .all(|d| reading(d.temperature_min) <= thresholds.cold_c)
            {
                kinds.push(EventKind::ColdWave);
            }
        }

        if !kinds.is_empty() {
            events.push(ExtremeEvent {
                date: day.date,
                kinds,
            });
        }
    }

    events
}

fn reading(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Alerts for the first week of a forecast
pub fn upcoming_alerts(series: &DailySeries, thresholds: &Thresholds) -> Vec<ExtremeEvent> {
    detect_extreme_events(&series.first_days(ALERT_HORIZON_DAYS), thresholds)
}
