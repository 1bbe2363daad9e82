use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use service_station::events::{LogObserver, ProgressObserver};
use service_station::{Config, ServiceStation, StationObserver};

fn main() -> Result<()> {
    let config = Config::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    config.validate().context("Invalid station configuration")?;

    let observer: Arc<dyn StationObserver> = if config.progress {
        Arc::new(ProgressObserver::new(config.cars))
    } else {
        Arc::new(LogObserver)
    };

    let station = ServiceStation::from_config(config).context("Failed to build station")?;
    let report = station.run(observer).context("Station run failed")?;

    println!(
        "ServiceStation finished: {} of {} car(s) served in {:.1?} (peak {} simultaneous service(s))",
        report.cars_served, report.cars_arrived, report.elapsed, report.peak_concurrent_services
    );
    if report.services_failed > 0 {
        println!("  {} service(s) failed", report.services_failed);
    }
    for (index, served) in report.served_per_pump.iter().enumerate() {
        println!("  Pump {}: {served} car(s)", index + 1);
    }

    Ok(())
}
