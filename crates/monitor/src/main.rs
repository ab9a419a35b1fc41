use clap::CommandFactory;
use slog::{error, info, warn, Logger};
use std::{sync::Arc, time::Duration};
use tokio::{signal, sync::Mutex, time::interval};
use weather_monitor::{
    get_config_info, setup_logger, City, Cli, Command, HttpFetcher, Monitor, RateLimiter,
    RemoteWeather,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let (cli, source, skipped) = get_config_info()?;
    let logger = setup_logger(&cli);
    if let Some(err) = skipped {
        warn!(logger, "Ignoring config file {}: {:#}", source, err);
    }

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    info!(logger, "Weather monitor starting...");
    info!(logger, "  Config: {}", source);
    info!(logger, "  Cache TTL: {} seconds", cli.cache_ttl().as_secs());

    let rate_limiter = Arc::new(Mutex::new(RateLimiter::new(
        cli.token_capacity(),
        cli.refill_rate(),
    )));
    let fetcher = Arc::new(HttpFetcher::new(
        logger.clone(),
        &cli.fetch_settings(),
        rate_limiter,
    )?);
    let api = Arc::new(RemoteWeather::new(logger.clone(), fetcher, cli.endpoints()));
    let watch_interval = cli.watch_interval();
    let monitor = Monitor::new(logger.clone(), api, cli);

    if let Command::Watch(location) = &command {
        let city = monitor.resolve_location(location).await?;
        watch_forecast(&monitor, &city, logger, watch_interval).await;
        return Ok(());
    }

    let output = monitor.run(&command).await?;
    print!("{}", output);
    Ok(())
}

async fn watch_forecast(monitor: &Monitor, city: &City, logger: Logger, every: u64) {
    info!(
        logger,
        "Watching {}, scanning every {} seconds", city.name, every
    );

    let mut scan_interval = interval(Duration::from_secs(every));
    let shutdown = shutdown_signal(logger.clone());
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = scan_interval.tick() => {
                match monitor.watch_once(city).await {
                    Ok(alerts) => info!(logger, "Scan finished with {} alerts, next in {} seconds", alerts.len(), every),
                    Err(err) => error!(logger, "Error scanning forecast: {:#}", err),
                }
            }
            _ = &mut shutdown => {
                info!(logger, "Shutting down watch");
                break;
            }
        }
    }
}

async fn shutdown_signal(logger: Logger) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(logger, "failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                error!(logger, "failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
