//! Technical reports for detected extreme events.
//!
//! A report is plain Markdown. It can be printed or written next to the
//! other reports as `report_{city}_{date}.md`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime};
use weather_monitor_core::{sanitize_file_name, write_file};

use crate::{format_date, parse_date, City, EventKind, ExtremeEvent};

pub const TITLE_PREFIX: &str = "Extreme Weather Event Technical Report - ";

pub const RECOMMENDATIONS: [&str; 4] = [
    "Inspect buildings and infrastructure for damage",
    "Monitor risk areas for further events",
    "Follow updated weather bulletins",
    "Activate contingency plans as needed",
];

/// Static map of the surroundings on the event date. No imagery is fetched,
/// the url is a reference for whoever reads the report.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteImage {
    pub image_url: String,
    pub source: String,
    pub date: Date,
}

impl SatelliteImage {
    pub fn for_event(city: &City, date: Date, api_key: Option<&str>) -> Self {
        let mut image_url = format!(
            "https://maps.googleapis.com/maps/api/staticmap?center={lat},{lon}&zoom=10&size=600x300&maptype=hybrid&markers=color:red%7C{lat},{lon}",
            lat = city.latitude,
            lon = city.longitude
        );
        if let Some(key) = api_key {
            image_url.push_str("&key=");
            image_url.push_str(key);
        }
        SatelliteImage {
            image_url,
            source: String::from("Google Maps Satellite (approximate)"),
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalReport {
    pub title: String,
    pub generated_at: OffsetDateTime,
    pub location: City,
    pub events: Vec<ExtremeEvent>,
    pub satellite_images: Vec<SatelliteImage>,
    pub analysis: Vec<String>,
    pub recommendations: Vec<String>,
}

fn analysis_line(kind: &EventKind, date: &str) -> String {
    match kind {
        EventKind::ExtremePrecipitation { .. } => format!(
            "Intense precipitation on {} may indicate a risk of flooding or landslides.",
            date
        ),
        EventKind::WindGust { .. } => format!(
            "Wind gusts on {} may have damaged structures and vegetation.",
            date
        ),
        EventKind::HeatWave => format!(
            "Prolonged heat up to {} with impacts on public health and energy demand.",
            date
        ),
        EventKind::ColdWave => format!(
            "Prolonged cold up to {} with risks for agriculture and vulnerable people.",
            date
        ),
    }
}

pub fn generate_technical_report(
    events: &[ExtremeEvent],
    city: &City,
    satellite_images: Vec<SatelliteImage>,
    generated_at: OffsetDateTime,
) -> TechnicalReport {
    let analysis = events
        .iter()
        .flat_map(|event| {
            let date = format_date(event.date);
            event
                .kinds
                .iter()
                .map(move |kind| analysis_line(kind, &date))
        })
        .collect();

    TechnicalReport {
        title: format!("{}{}", TITLE_PREFIX, city.name),
        generated_at,
        location: city.clone(),
        events: events.to_vec(),
        satellite_images,
        analysis,
        recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
    }
}

impl TechnicalReport {
    pub fn to_markdown(&self) -> String {
        let generated = self
            .generated_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.generated_at.to_string());

        let mut out = format!("# {}\n\n", self.title);
        out.push_str(&format!("- Report date: {}\n", generated));
        out.push_str(&format!("- Location: {}\n", self.location.place()));
        out.push_str(&format!(
            "- Coordinates: {:.4}, {:.4}\n\n",
            self.location.latitude, self.location.longitude
        ));

        out.push_str("## Detected events\n\n");
        if self.events.is_empty() {
            out.push_str("No extreme events detected.\n");
        }
        for event in &self.events {
            out.push_str(&format!("### {}\n\n", format_date(event.date)));
            for kind in &event.kinds {
                out.push_str(&format!("- {}\n", kind));
            }
            out.push('\n');
        }

        if !self.satellite_images.is_empty() {
            out.push_str("## Satellite imagery\n\n");
            for image in &self.satellite_images {
                out.push_str(&format!(
                    "- {} ({}): {}\n",
                    image.source,
                    format_date(image.date),
                    image.image_url
                ));
            }
            out.push('\n');
        }

        out.push_str("## Technical analysis\n\n");
        for line in &self.analysis {
            out.push_str(&format!("- {}\n", line));
        }
        out.push('\n');

        out.push_str("## Recommendations\n\n");
        for line in &self.recommendations {
            out.push_str(&format!("- {}\n", line));
        }
        out
    }

    /// `report_{city}_{date}.md`, dated by the single event or else the report date
    pub fn file_name(&self) -> String {
        let date = match self.events.as_slice() {
            [event] => event.date,
            _ => self.generated_at.date(),
        };
        format!(
            "report_{}_{}.md",
            sanitize_file_name(&self.location.name),
            format_date(date)
        )
    }

    pub fn save(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(self.file_name());
        write_file(&path, &self.to_markdown())?;
        Ok(path)
    }
}

/// A report file found in the reports directory
#[derive(Debug, Clone, PartialEq)]
pub struct SavedReport {
    pub path: PathBuf,
    pub city: String,
    /// Date in the file name, the event date or the report date
    pub event_date: Date,
    pub generated_at: Option<OffsetDateTime>,
}

impl SavedReport {
    /// Read a `report_{city}_{date}.md` file, other names are not reports
    pub fn read(path: &Path) -> io::Result<Option<SavedReport>> {
        let Some((file_city, event_date)) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_file_name)
        else {
            return Ok(None);
        };
        let content = fs::read_to_string(path)?;

        let city = content
            .lines()
            .find_map(|line| line.strip_prefix("# ")?.strip_prefix(TITLE_PREFIX))
            .map(str::to_string)
            .unwrap_or_else(|| file_city.replace('_', " "));
        let generated_at = content
            .lines()
            .find_map(|line| line.strip_prefix("- Report date: "))
            .and_then(|value| OffsetDateTime::parse(value.trim(), &Rfc3339).ok());

        Ok(Some(SavedReport {
            path: path.to_path_buf(),
            city,
            event_date,
            generated_at,
        }))
    }
}

fn parse_file_name(name: &str) -> Option<(&str, Date)> {
    let stem = name.strip_prefix("report_")?.strip_suffix(".md")?;
    let (city, date) = stem.rsplit_once('_')?;
    if city.is_empty() {
        return None;
    }
    Some((city, parse_date(date).ok()?))
}

/// Reports saved in `dir`, newest event first. A missing directory has none.
pub fn list_saved_reports(dir: &Path) -> io::Result<Vec<SavedReport>> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut reports = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(report) = SavedReport::read(&entry.path())? {
            reports.push(report);
        }
    }
    reports.sort_by(|a, b| {
        b.event_date
            .cmp(&a.event_date)
            .then_with(|| a.city.cmp(&b.city))
    });
    Ok(reports)
}
