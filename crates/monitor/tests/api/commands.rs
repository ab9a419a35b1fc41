use crate::helpers::{city, hot_days, porto_alegre, rainy_days, spawn_monitor, MockWeatherAccess, TODAY};
use time::macros::date;
use weather_monitor::{
    AirQuality, Cli, Command, CurrentConditions, Error, EventKind, FireHotspot, Forecast,
    LocationArgs,
};

fn forecast_with(daily: weather_monitor::DailySeries) -> Forecast {
    Forecast {
        timezone: String::from("America/Sao_Paulo"),
        current: Some(CurrentConditions {
            time: String::from("2024-05-10T09:00"),
            temperature_2m: Some(18.4),
            weather_code: Some(3),
            ..Default::default()
        }),
        daily,
        ..Default::default()
    }
}

#[tokio::test]
async fn search_lists_candidates() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .withf(|name| name == "Porto Alegre")
        .times(1)
        .returning(|_| Ok(vec![porto_alegre(), city("Porto Alegre", -10.9, -49.6)]));

    let monitor = spawn_monitor(weather, Cli::default());
    let output = monitor
        .run(&Command::Search {
            name: String::from("Porto Alegre"),
        })
        .await
        .unwrap();

    assert!(output.contains("[0] Porto Alegre, Rio Grande do Sul, Brazil (Lat: -30.03, Lon: -51.23)"));
    assert!(output.contains("[1] Porto Alegre, Rio Grande do Sul, Brazil (Lat: -10.90, Lon: -49.60)"));
}

#[tokio::test]
async fn picks_requested_candidate() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre(), city("Pelotas", -31.77, -52.34)]));
    weather
        .expect_forecast()
        .withf(|city, days| city.name == "Pelotas" && *days == 1)
        .times(1)
        .returning(|_, _| Ok(forecast_with(Default::default())));

    let monitor = spawn_monitor(weather, Cli::default());
    let location = LocationArgs {
        pick: 1,
        ..LocationArgs::named("pelotas")
    };
    let output = monitor.run(&Command::Current(location)).await.unwrap();

    assert!(output.starts_with("Current conditions in Pelotas\n"));
    assert!(output.contains("Temperature     18.4 °C"));
    assert!(output.contains("Condition       Overcast"));
}

#[tokio::test]
async fn unknown_city_is_an_error() {
    let mut weather = MockWeatherAccess::new();
    weather.expect_search_cities().returning(|_| Ok(vec![]));

    let monitor = spawn_monitor(weather, Cli::default());
    let err = monitor
        .run(&Command::Current(LocationArgs::named("Atlantis")))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::NoResults(name)) if name == "Atlantis"
    ));
}

#[tokio::test]
async fn pick_out_of_range_is_an_error() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));

    let monitor = spawn_monitor(weather, Cli::default());
    let location = LocationArgs {
        pick: 3,
        ..LocationArgs::named("Porto Alegre")
    };
    let err = monitor.run(&Command::Air(location)).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::OutOfRange {
            index: 3,
            available: 1
        })
    ));
}

#[tokio::test]
async fn missing_location_is_an_error() {
    let monitor = spawn_monitor(MockWeatherAccess::new(), Cli::default());
    let err = monitor
        .run(&Command::Fires(LocationArgs::default()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("a location is required"));
}

#[tokio::test]
async fn coordinates_skip_geocoding() {
    let mut weather = MockWeatherAccess::new();
    weather.expect_search_cities().never();
    weather
        .expect_air_quality()
        .withf(|city| city.latitude == -23.55 && city.longitude == -46.63)
        .returning(|_| Ok(AirQuality::default()));

    let monitor = spawn_monitor(weather, Cli::default());
    let output = monitor
        .run(&Command::Air(LocationArgs::at(-23.55, -46.63)))
        .await
        .unwrap();

    assert!(output.starts_with("Air quality in Current location\n"));
    assert!(output.contains("No air quality data available"));
}

#[tokio::test]
async fn weekly_forecast_shows_alerts() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather
        .expect_forecast()
        .withf(|_, days| *days == 7)
        .returning(|_, _| {
            Ok(forecast_with(rainy_days(
                TODAY,
                &[5.0, 80.0, 2.0, 0.0, 0.0, 0.0, 0.0],
            )))
        });

    let monitor = spawn_monitor(weather, Cli::default());
    let output = monitor
        .run(&Command::Forecast {
            location: LocationArgs::named("Porto Alegre"),
            days: 7,
        })
        .await
        .unwrap();

    assert!(output.starts_with("7 day forecast for Porto Alegre\n"));
    assert!(output.contains("  - 2024-05-11: Extreme precipitation: 80 mm"));
}

#[tokio::test]
async fn thresholds_come_from_config() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather.expect_forecast().returning(|_, _| {
        Ok(forecast_with(rainy_days(
            TODAY,
            &[5.0, 80.0, 2.0, 0.0, 0.0, 0.0, 0.0],
        )))
    });

    let cli = Cli {
        precipitation_threshold: Some(100.0),
        ..Default::default()
    };
    let monitor = spawn_monitor(weather, cli);
    let output = monitor
        .run(&Command::Forecast {
            location: LocationArgs::named("Porto Alegre"),
            days: 7,
        })
        .await
        .unwrap();

    assert!(output.contains("No alerts for the coming days"));
}

#[tokio::test]
async fn history_scan_finds_heat_wave() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather
        .expect_daily_history()
        .withf(|_, window| window.end == TODAY && window.start == date!(2024 - 04 - 10))
        .times(1)
        .returning(|_, _| {
            Ok(hot_days(
                date!(2024 - 05 - 01),
                &[30.0, 36.0, 37.0, 38.0, 31.0],
            ))
        });

    let monitor = spawn_monitor(weather, Cli::default());
    let output = monitor
        .run(&Command::Events {
            location: LocationArgs::named("Porto Alegre"),
            days: None,
        })
        .await
        .unwrap();

    assert!(output.contains("1 extreme events detected in the last 30 days"));
    assert!(output.contains("Event on 2024-05-04\n  - Heat wave detected"));
}

#[tokio::test]
async fn oversized_history_window_is_an_error() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather.expect_daily_history().never();

    let monitor = spawn_monitor(weather, Cli::default());
    let err = monitor
        .run(&Command::Events {
            location: LocationArgs::named("Porto Alegre"),
            days: Some(8_000_000),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::InvalidWindow { days: 8_000_000 })
    ));
}

#[tokio::test]
async fn fires_use_configured_query() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather
        .expect_fire_hotspots()
        .withf(|_, query, today| query.radius_km == 50.0 && query.days_back == 3 && *today == TODAY)
        .times(1)
        .returning(|_, _, _| {
            Ok(vec![FireHotspot {
                latitude: -30.1,
                longitude: -51.4,
                acq_date: String::from("2024-05-09"),
                acq_time: String::from("0412"),
                confidence: String::from("n"),
                frp: Some(2.5),
                distance_km: 17.9,
            }])
        });

    let cli = Cli {
        fire_radius_km: Some(50.0),
        fire_days_back: Some(3),
        ..Default::default()
    };
    let monitor = spawn_monitor(weather, cli);
    let output = monitor
        .run(&Command::Fires(LocationArgs::named("Porto Alegre")))
        .await
        .unwrap();

    assert!(output.contains("1 fire hotspots within 50 km in the last 3 days"));
    assert!(output.contains("2024-05-09"));
}

#[tokio::test]
async fn report_for_date_is_saved() {
    let tmp = tempfile::tempdir().unwrap();
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather
        .expect_daily_history()
        .withf(|_, window| window.end == date!(2024 - 05 - 02))
        .returning(|_, _| Ok(rainy_days(date!(2024 - 04 - 30), &[10.0, 120.0, 150.0])));

    let cli = Cli {
        reports_dir: Some(tmp.path().to_string_lossy().to_string()),
        ..Default::default()
    };
    let monitor = spawn_monitor(weather, cli);
    let output = monitor
        .run(&Command::Report {
            location: LocationArgs::named("Porto Alegre"),
            date: Some(String::from("2024-05-02")),
            save: true,
        })
        .await
        .unwrap();

    assert!(output.contains("- Extreme precipitation: 150 mm"));
    assert!(!output.contains("120 mm"));
    assert!(output.contains("## Satellite imagery"));
    assert!(output.contains("Report saved to"));

    let saved = std::fs::read_to_string(tmp.path().join("report_Porto_Alegre_2024-05-02.md")).unwrap();
    assert!(saved.starts_with("# Extreme Weather Event Technical Report - Porto Alegre\n"));
    assert!(saved.contains("flooding or landslides"));
}

#[tokio::test]
async fn report_rejects_bad_date() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather.expect_daily_history().never();

    let monitor = spawn_monitor(weather, Cli::default());
    let err = monitor
        .run(&Command::Report {
            location: LocationArgs::named("Porto Alegre"),
            date: Some(String::from("02/05/2024")),
            save: false,
        })
        .await
        .unwrap_err();

    assert!(err.to_string().contains("invalid --date 02/05/2024"));
}

#[tokio::test]
async fn overview_survives_failing_section() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather
        .expect_forecast()
        .withf(|_, days| *days == 16)
        .returning(|_, _| Ok(forecast_with(rainy_days(TODAY, &[1.0; 16]))));
    weather
        .expect_daily_history()
        .returning(|_, _| Ok(Default::default()));
    weather
        .expect_fire_hotspots()
        .returning(|_, _, _| Err(Error::RateLimited));
    weather
        .expect_air_quality()
        .returning(|_| Ok(AirQuality::default()));

    let monitor = spawn_monitor(weather, Cli::default());
    let output = monitor
        .run(&Command::Overview(LocationArgs::named("Porto Alegre")))
        .await
        .unwrap();

    assert!(output.contains("Current conditions in Porto Alegre"));
    assert!(output.contains("7 day forecast for Porto Alegre"));
    assert!(output.contains("Extended 16 day forecast for Porto Alegre"));
    assert!(output.contains("No extreme events detected in the last 30 days"));
    assert!(output.contains("No extreme events to report"));
    assert!(output.contains("Fire hotspots unavailable: Rate limit exceeded after retries"));
    assert!(output.contains("Air quality in Porto Alegre"));
}

#[tokio::test]
async fn watch_scan_returns_alerts() {
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_forecast()
        .withf(|_, days| *days == 7)
        .times(1)
        .returning(|_, _| Ok(forecast_with(rainy_days(TODAY, &[70.0, 0.0, 0.0]))));

    let monitor = spawn_monitor(weather, Cli::default());
    let alerts = monitor.watch_once(&porto_alegre()).await.unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].date, TODAY);
    assert_eq!(alerts[0].kinds, vec![EventKind::ExtremePrecipitation { mm: 70.0 }]);
}

#[tokio::test]
async fn saved_reports_are_listed() {
    let tmp = tempfile::tempdir().unwrap();
    let mut weather = MockWeatherAccess::new();
    weather
        .expect_search_cities()
        .returning(|_| Ok(vec![porto_alegre()]));
    weather
        .expect_daily_history()
        .times(1)
        .returning(|_, _| Ok(rainy_days(date!(2024 - 04 - 30), &[10.0, 120.0, 150.0])));

    let cli = Cli {
        reports_dir: Some(tmp.path().join("reports").to_string_lossy().to_string()),
        ..Default::default()
    };
    let monitor = spawn_monitor(weather, cli);

    let empty = monitor.run(&Command::Reports).await.unwrap();
    assert!(empty.starts_with("No saved reports in "));

    monitor
        .run(&Command::Report {
            location: LocationArgs::named("Porto Alegre"),
            date: Some(String::from("2024-05-02")),
            save: true,
        })
        .await
        .unwrap();
    std::fs::write(tmp.path().join("reports").join("readme.txt"), "notes").unwrap();

    let output = monitor.run(&Command::Reports).await.unwrap();
    let rows: Vec<&str> = output.lines().skip(3).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("Porto Alegre"));
    assert!(rows[0].contains("2024-05-02"));
    assert!(rows[0].contains("2024-05-10T00:00:00Z"));
    assert!(rows[0].ends_with("report_Porto_Alegre_2024-05-02.md"));
}
