//! Plain text rendering of the monitor views for the terminal.

use crate::{
    describe_opt, format_date, format_hour, AirQuality, City, DailySeries, ExtremeEvent,
    FireHotspot, FireQuery, Forecast, SavedReport, TechnicalReport,
};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

/// "12.3 unit", or "-" when the reading is missing
pub fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if unit.is_empty() => format!("{:.1}", v),
        Some(v) => format!("{:.1} {}", v, unit),
        None => String::from("-"),
    }
}

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(title.chars().count()))
}

pub fn render_cities(name: &str, cities: &[City]) -> String {
    if cities.is_empty() {
        return format!("No locations found for '{}'\n", name);
    }
    let mut out = heading(&format!("Locations matching '{}'", name));
    for (i, city) in cities.iter().enumerate() {
        out.push_str(&format!("[{}] {}\n", i, city.label()));
    }
    out
}

pub fn render_current(city: &City, forecast: &Forecast) -> String {
    let mut out = heading(&format!("Current conditions in {}", city.name));
    let Some(current) = forecast.current.as_ref() else {
        out.push_str("No current conditions available\n");
        return out;
    };
    let rows = [
        ("Observed", current.time.replace('T', " ")),
        ("Temperature", reading(current.temperature_2m, "°C")),
        ("Feels like", reading(current.apparent_temperature, "°C")),
        ("Humidity", reading(current.relative_humidity_2m, "%")),
        ("Wind", reading(current.wind_speed_10m, "km/h")),
        ("Wind direction", reading(current.wind_direction_10m, "°")),
        ("Precipitation", reading(current.precipitation, "mm")),
        ("Condition", describe_opt(current.weather_code).to_string()),
    ];
    for (label, value) in rows {
        out.push_str(&format!("{:<15} {}\n", label, value));
    }
    out.push_str(&format!("{:<15} {}\n", "Timezone", forecast.timezone));

    let upcoming: Vec<String> = forecast
        .hourly
        .sampled(6)
        .take(4)
        .map(|h| format!("{} {}", format_hour(h.time), reading(h.temperature, "°C")))
        .collect();
    if !upcoming.is_empty() {
        out.push_str(&format!("{:<15} {}\n", "Next hours", upcoming.join(" | ")));
    }
    out
}

pub fn render_daily_table(series: &DailySeries) -> String {
    let mut out = format!(
        "{:<11} {:>9} {:>9} {:>9} {:>10} {:>7}  {}\n",
        "Date", "Max °C", "Min °C", "Rain mm", "Wind km/h", "Dir °", "Condition"
    );
    for day in series.iter() {
        out.push_str(&format!(
            "{:<11} {:>9} {:>9} {:>9} {:>10} {:>7}  {}\n",
            format_date(day.date),
            reading(day.temperature_max, ""),
            reading(day.temperature_min, ""),
            reading(day.precipitation_sum, ""),
            reading(day.wind_speed_max, ""),
            day.wind_direction_dominant
                .map(|d| format!("{:.0}", d))
                .unwrap_or_else(|| String::from("-")),
            describe_opt(day.weather_code)
        ));
    }
    out
}

pub fn render_alerts(alerts: &[ExtremeEvent]) -> String {
    if alerts.is_empty() {
        return String::from("No alerts for the coming days\n");
    }
    let mut out = String::from("Alerts for the coming days:\n");
    for alert in alerts {
        out.push_str(&format!("  - {}\n", alert.summary()));
    }
    out
}

pub fn render_weekly(city: &City, series: &DailySeries, alerts: &[ExtremeEvent]) -> String {
    let mut out = heading(&format!("{} day forecast for {}", series.len(), city.name));
    out.push_str(&render_daily_table(series));
    out.push('\n');
    out.push_str(&render_alerts(alerts));
    out
}

pub fn render_extended(city: &City, series: &DailySeries) -> String {
    let mut out = heading(&format!(
        "Extended {} day forecast for {}",
        series.len(),
        city.name
    ));
    out.push_str(&render_daily_table(series));
    out.push('\n');

    let highlights = [
        (
            "Wettest day",
            series
                .max_precipitation()
                .map(|d| (d.date, reading(d.precipitation_sum, "mm"))),
        ),
        (
            "Windiest day",
            series
                .max_wind()
                .map(|d| (d.date, reading(d.wind_speed_max, "km/h"))),
        ),
        (
            "Hottest day",
            series
                .hottest()
                .map(|d| (d.date, reading(d.temperature_max, "°C"))),
        ),
        (
            "Coldest night",
            series
                .coldest()
                .map(|d| (d.date, reading(d.temperature_min, "°C"))),
        ),
    ];
    for (label, value) in highlights {
        if let Some((date, value)) = value {
            out.push_str(&format!("{:<14} {} ({})\n", label, format_date(date), value));
        }
    }
    out
}

pub fn render_events(city: &City, days: u32, events: &[ExtremeEvent]) -> String {
    let mut out = heading(&format!("Extreme events in {}", city.name));
    if events.is_empty() {
        out.push_str(&format!(
            "No extreme events detected in the last {} days\n",
            days
        ));
        return out;
    }
    out.push_str(&format!(
        "{} extreme events detected in the last {} days\n\n",
        events.len(),
        days
    ));
    for event in events {
        out.push_str(&format!("Event on {}\n", format_date(event.date)));
        for kind in &event.kinds {
            out.push_str(&format!("  - {}\n", kind));
        }
    }
    out
}

pub fn render_fires(city: &City, query: &FireQuery, hotspots: &[FireHotspot]) -> String {
    let mut out = heading(&format!("Fire hotspots near {}", city.name));
    if hotspots.is_empty() {
        out.push_str(&format!(
            "No fire hotspots within {:.0} km in the last {} days\n",
            query.radius_km,
            query.day_range()
        ));
        return out;
    }
    out.push_str(&format!(
        "{} fire hotspots within {:.0} km in the last {} days\n\n",
        hotspots.len(),
        query.radius_km,
        query.day_range()
    ));
    out.push_str(&format!(
        "{:>10} {:>11} {:<11} {:>5} {:>10} {:>8} {:>9}\n",
        "Latitude", "Longitude", "Date", "Time", "Confidence", "FRP MW", "Dist km"
    ));
    for spot in hotspots {
        out.push_str(&format!(
            "{:>10.4} {:>11.4} {:<11} {:>5} {:>10} {:>8} {:>9.1}\n",
            spot.latitude,
            spot.longitude,
            spot.acq_date,
            spot.acq_time,
            spot.confidence,
            reading(spot.frp, ""),
            spot.distance_km
        ));
    }
    out
}

pub fn render_air_quality(city: &City, air: &AirQuality) -> String {
    let mut out = heading(&format!("Air quality in {}", city.name));
    let Some(current) = air.current.as_ref() else {
        out.push_str("No air quality data available\n");
        return out;
    };
    let rows = [
        ("PM10", reading(current.pm10, "μg/m³")),
        ("PM2.5", reading(current.pm2_5, "μg/m³")),
        ("CO", reading(current.carbon_monoxide, "μg/m³")),
        ("NO2", reading(current.nitrogen_dioxide, "μg/m³")),
        ("Ozone", reading(current.ozone, "μg/m³")),
        ("European AQI", reading(current.european_aqi, "")),
        ("US AQI", reading(current.us_aqi, "")),
    ];
    for (label, value) in rows {
        out.push_str(&format!("{:<13} {}\n", label, value));
    }
    if let Some(band) = air.band() {
        out.push_str(&format!("{:<13} {}\n", "Rating", band));
    }
    if let Some(peak) = air.peak_pm2_5() {
        out.push_str(&format!(
            "{:<13} {} at {}\n",
            "Peak PM2.5",
            reading(peak.pm2_5, "μg/m³"),
            format_hour(peak.time)
        ));
    }
    out
}

/// Short form of a report for the overview, the full text is `report --city`
pub fn render_report_summary(report: &TechnicalReport) -> String {
    let mut out = heading(&report.title);
    if report.events.is_empty() {
        out.push_str("No extreme events to report\n");
        return out;
    }
    out.push_str(&format!(
        "{} events, {} analysis notes\n",
        report.events.len(),
        report.analysis.len()
    ));
    for line in &report.analysis {
        out.push_str(&format!("  - {}\n", line));
    }
    out
}

pub fn render_saved_reports(dir: &Path, reports: &[SavedReport]) -> String {
    if reports.is_empty() {
        return format!("No saved reports in {}\n", dir.display());
    }
    let mut out = heading(&format!("Saved reports in {}", dir.display()));
    out.push_str(&format!("{:<24} {:<12} {:<22} File\n", "City", "Event date", "Report date"));
    for report in reports {
        let generated = report
            .generated_at
            .and_then(|at| at.format(&Rfc3339).ok())
            .unwrap_or_else(|| String::from("-"));
        let file = report
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<24} {:<12} {:<22} {}\n",
            report.city,
            format_date(report.event_date),
            generated,
            file
        ));
    }
    out
}
