//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::SimulationConfig;
use exposure::{ArtifactNamer, ExposureScheduler};
use runner::{FanOut, FanOutReport, UnitPlan, UriBackendFactory};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::settings;

/// Execute the `run` command
pub async fn run_simulation(args: &RunArgs) -> Result<()> {
    let config = settings::resolve(&args.sim)?;
    let plans = UnitPlan::from_config(&config).context("Failed to plan units")?;

    info!(
        destination = %config.destination,
        start = %config.start_time,
        interval_secs = config.interval_secs,
        exposures = config.num_exposures,
        units = plans.len(),
        compress = config.compress,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_plan_summary(&config, &plans);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let factory = UriBackendFactory::new(config.destination.clone(), config.transport.clone());
    let fanout = FanOut::new(plans, factory).context("Nothing to run")?;

    info!("Starting simulation...");

    let report = tokio::select! {
        report = fanout.run() => report,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, abandoning in-flight exposures");
            return Ok(());
        }
    };

    // unit outcomes are in the report; they never change the exit status
    print_report(&report);
    info!("camxfer finished");
    Ok(())
}

/// Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

/// Print the unit layout for dry-run mode
fn print_plan_summary(config: &SimulationConfig, plans: &[UnitPlan]) {
    let Some(first) = plans.first() else {
        return;
    };
    let scheduler = ExposureScheduler::new(first.schedule);
    let obs_day = scheduler.obs_day();

    println!("\n=== Simulation Plan ===\n");
    println!("Destination: {}", config.destination);
    if let Ok(destination) = transport::Destination::parse(&config.destination) {
        println!("  Backend: {} ({destination})", destination.backend_name());
    }
    println!(
        "Schedule: {} exposures from {} every {}s",
        config.num_exposures, config.start_time, config.interval_secs
    );
    println!("  First trigger: {}", scheduler.trigger_time(0));
    println!("Compress: {}", config.compress);

    println!("\nUnits ({}):", plans.len());
    for plan in plans {
        let namer = ArtifactNamer::new(
            &plan.schedule,
            &plan.unit,
            plan.unit_count,
            plan.camera,
            obs_day,
        );
        println!("  - {} -> {}", plan.unit, namer.artifact_path(0));
    }
    println!();
}

/// Print the aggregate outcome of a run
fn print_report(report: &FanOutReport) {
    println!("\n=== Run Summary ===\n");
    println!("Elapsed: {:.2}s", report.elapsed.as_secs_f64());
    println!("{report}");

    println!("\nUnits:");
    for unit in &report.units {
        println!("  - {unit}");
    }
    for failure in &report.join_failures {
        println!("  ! {failure}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SimulationArgs;
    use contracts::StartTime;

    fn args(temp: &std::path::Path, dry_run: bool) -> RunArgs {
        RunArgs {
            sim: SimulationArgs {
                destination: Some("http://127.0.0.1:1/x".to_string()),
                starttime: Some(StartTime::new(0, 0).unwrap()),
                numexp: Some(1),
                inputfile: Some(temp.join("missing").join("S00.fits")),
                tempdir: Some(temp.to_path_buf()),
                node: Some(0),
                ..SimulationArgs::default()
            },
            metrics_port: 0,
            dry_run,
        }
    }

    #[tokio::test]
    async fn test_all_units_aborted_still_succeeds() {
        let temp = tempfile::tempdir().unwrap();
        run_simulation(&args(temp.path(), false)).await.unwrap();
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let temp = tempfile::tempdir().unwrap();
        run_simulation(&args(temp.path(), true)).await.unwrap();
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
