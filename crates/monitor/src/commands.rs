use anyhow::{anyhow, Context};
use slog::{error, info, warn, Logger};
use std::sync::Arc;
use time::{Date, OffsetDateTime};

use crate::{
    detect_extreme_events, display, generate_technical_report, list_saved_reports, parse_date,
    upcoming_alerts,
    City, Cli, Command, Error, ExtremeEvent, HistoryWindow, LocationArgs, SatelliteImage,
    TechnicalReport, WeatherApi, ALERT_HORIZON_DAYS,
};

/// Runs the monitor commands against a weather source
pub struct Monitor {
    logger: Logger,
    api: Arc<dyn WeatherApi>,
    cli: Cli,
    today: Option<Date>,
}

impl Monitor {
    pub fn new(logger: Logger, api: Arc<dyn WeatherApi>, cli: Cli) -> Self {
        Monitor {
            logger,
            api,
            cli,
            today: None,
        }
    }

    /// Pin "today" instead of reading the clock
    pub fn at_date(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> Date {
        self.today
            .unwrap_or_else(|| OffsetDateTime::now_utc().date())
    }

    fn now(&self) -> OffsetDateTime {
        match self.today {
            Some(today) => today.midnight().assume_utc(),
            None => OffsetDateTime::now_utc(),
        }
    }

    pub async fn resolve_location(&self, args: &LocationArgs) -> anyhow::Result<City> {
        if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
            return Ok(City::from_coordinates(lat, lon));
        }
        let Some(name) = args.city.as_deref() else {
            return Err(anyhow!(
                "a location is required, use --city NAME or --lat LAT --lon LON"
            ));
        };

        let mut candidates = self.api.search_cities(name).await?;
        if candidates.is_empty() {
            return Err(Error::NoResults(name.to_string()).into());
        }
        if args.pick >= candidates.len() {
            return Err(Error::OutOfRange {
                index: args.pick,
                available: candidates.len(),
            }
            .into());
        }
        let city = candidates.swap_remove(args.pick);
        info!(self.logger, "using location {}", city.label());
        Ok(city)
    }

    pub async fn search(&self, name: &str) -> anyhow::Result<String> {
        let cities = self.api.search_cities(name).await?;
        Ok(display::render_cities(name, &cities))
    }

    pub async fn current(&self, city: &City) -> anyhow::Result<String> {
        let forecast = self.api.forecast(city, 1).await?;
        Ok(display::render_current(city, &forecast))
    }

    pub async fn forecast(&self, city: &City, days: u8) -> anyhow::Result<String> {
        let forecast = self.api.forecast(city, days).await?;
        let alerts = upcoming_alerts(&forecast.daily, &self.cli.thresholds());
        if forecast.daily.len() > ALERT_HORIZON_DAYS {
            let mut out = display::render_extended(city, &forecast.daily);
            out.push('\n');
            out.push_str(&display::render_alerts(&alerts));
            return Ok(out);
        }
        Ok(display::render_weekly(city, &forecast.daily, &alerts))
    }

    /// Extreme events over the `days` days up to `end`
    pub async fn past_events(
        &self,
        city: &City,
        end: Date,
        days: u32,
    ) -> anyhow::Result<Vec<ExtremeEvent>> {
        let window = HistoryWindow::ending(end, days)?;
        let series = self.api.daily_history(city, window).await?;
        let events = detect_extreme_events(&series, &self.cli.thresholds());
        info!(
            self.logger,
            "{} extreme events in {} days of history for {}",
            events.len(),
            series.len(),
            city.name
        );
        Ok(events)
    }

    pub async fn events(&self, city: &City, days: Option<u32>) -> anyhow::Result<String> {
        let days = days.unwrap_or_else(|| self.cli.history_days());
        let events = self.past_events(city, self.today(), days).await?;
        Ok(display::render_events(city, days, &events))
    }

    pub async fn fires(&self, city: &City) -> anyhow::Result<String> {
        let query = self.cli.fire_query();
        let hotspots = self
            .api
            .fire_hotspots(city, &query, self.today())
            .await?;
        Ok(display::render_fires(city, &query, &hotspots))
    }

    pub async fn air(&self, city: &City) -> anyhow::Result<String> {
        let air = self.api.air_quality(city).await?;
        Ok(display::render_air_quality(city, &air))
    }

    /// Report on the history window ending at `date`, keeping only that day's
    /// event when a date is given
    pub async fn report(&self, city: &City, date: Option<Date>) -> anyhow::Result<TechnicalReport> {
        let end = date.unwrap_or_else(|| self.today());
        let mut events = self
            .past_events(city, end, self.cli.history_days())
            .await?;
        if let Some(date) = date {
            events.retain(|event| event.date == date);
        }

        let maps_api_key = self.cli.maps_api_key();
        let images = events
            .iter()
            .map(|event| SatelliteImage::for_event(city, event.date, maps_api_key.as_deref()))
            .collect();
        Ok(generate_technical_report(&events, city, images, self.now()))
    }

    async fn report_text(&self, city: &City, date: Option<&str>, save: bool) -> anyhow::Result<String> {
        let date = date
            .map(|value| parse_date(value).with_context(|| format!("invalid --date {}", value)))
            .transpose()?;
        let report = self.report(city, date).await?;
        let mut out = report.to_markdown();

        if save {
            let dir = self.cli.reports_dir();
            let path = report
                .save(&dir)
                .with_context(|| format!("failed to save report in {}", dir.display()))?;
            info!(self.logger, "report saved: {}", path.display());
            out.push_str(&format!("\nReport saved to {}\n", path.display()));
        }
        Ok(out)
    }

    pub fn reports(&self) -> anyhow::Result<String> {
        let dir = self.cli.reports_dir();
        let reports = list_saved_reports(&dir)
            .with_context(|| format!("failed to list reports in {}", dir.display()))?;
        info!(self.logger, "{} saved reports in {}", reports.len(), dir.display());
        Ok(display::render_saved_reports(&dir, &reports))
    }

    /// One forecast scan, alerts are logged as warnings
    pub async fn watch_once(&self, city: &City) -> anyhow::Result<Vec<ExtremeEvent>> {
        let forecast = self.api.forecast(city, ALERT_HORIZON_DAYS as u8).await?;
        let alerts = upcoming_alerts(&forecast.daily, &self.cli.thresholds());
        if alerts.is_empty() {
            info!(self.logger, "no alerts for {}", city.name);
        }
        for alert in &alerts {
            warn!(self.logger, "alert for {}: {}", city.name, alert.summary());
        }
        Ok(alerts)
    }

    fn section(&self, name: &str, result: anyhow::Result<String>) -> String {
        match result {
            Ok(text) => text,
            Err(err) => {
                error!(self.logger, "{} unavailable: {:#}", name, err);
                format!("{} unavailable: {:#}\n", name, err)
            }
        }
    }

    /// Every view for one location. A failing view is reported in place and
    /// the rest still render.
    pub async fn overview(&self, city: &City) -> anyhow::Result<String> {
        let mut sections = vec![];

        match self.api.forecast(city, self.cli.forecast_days()).await {
            Ok(forecast) => {
                let week = forecast.daily.first_days(ALERT_HORIZON_DAYS);
                let alerts = upcoming_alerts(&forecast.daily, &self.cli.thresholds());
                sections.push(display::render_current(city, &forecast));
                sections.push(display::render_weekly(city, &week, &alerts));
                if forecast.daily.len() > ALERT_HORIZON_DAYS {
                    sections.push(display::render_extended(city, &forecast.daily));
                }
            }
            Err(err) => sections.push(self.section("Forecast", Err(err.into()))),
        }

        let days = self.cli.history_days();
        let events = self.past_events(city, self.today(), days).await;
        match events {
            Ok(events) => {
                sections.push(display::render_events(city, days, &events));
                let report = generate_technical_report(&events, city, vec![], self.now());
                sections.push(display::render_report_summary(&report));
            }
            Err(err) => sections.push(self.section("Extreme events", Err(err))),
        }

        sections.push(self.section("Fire hotspots", self.fires(city).await));
        sections.push(self.section("Air quality", self.air(city).await));
        Ok(sections.join("\n"))
    }

    pub async fn run(&self, command: &Command) -> anyhow::Result<String> {
        match command {
            Command::Search { name } => self.search(name).await,
            Command::Current(location) => {
                let city = self.resolve_location(location).await?;
                self.current(&city).await
            }
            Command::Forecast { location, days } => {
                let city = self.resolve_location(location).await?;
                self.forecast(&city, *days).await
            }
            Command::Events { location, days } => {
                let city = self.resolve_location(location).await?;
                self.events(&city, *days).await
            }
            Command::Fires(location) => {
                let city = self.resolve_location(location).await?;
                self.fires(&city).await
            }
            Command::Air(location) => {
                let city = self.resolve_location(location).await?;
                self.air(&city).await
            }
            Command::Report {
                location,
                date,
                save,
            } => {
                let city = self.resolve_location(location).await?;
                self.report_text(&city, date.as_deref(), *save).await
            }
            Command::Overview(location) => {
                let city = self.resolve_location(location).await?;
                self.overview(&city).await
            }
            Command::Watch(location) => {
                let city = self.resolve_location(location).await?;
                let alerts = self.watch_once(&city).await?;
                Ok(display::render_alerts(&alerts))
            }
            Command::Reports => self.reports(),
        }
    }
}
