//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::SimulationConfig;
use exposure::{sequence_scale, ArtifactNamer, ExposureScheduler};
use runner::UnitPlan;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::settings;

/// Configuration info for JSON output
#[derive(Serialize)]
struct SimulationInfo {
    version: String,
    destination: DestinationInfo,
    schedule: ScheduleInfo,
    units: Vec<UnitInfo>,
    staging: StagingInfo,
    transport: contracts::TransportOptions,
}

#[derive(Serialize)]
struct DestinationInfo {
    uri: String,
    backend: String,
    resolved: String,
}

#[derive(Serialize)]
struct ScheduleInfo {
    start_time: String,
    interval_secs: u64,
    num_exposures: u32,
    first_trigger: String,
    obs_day: String,
    sequence_scale: u64,
}

#[derive(Serialize)]
struct UnitInfo {
    sensor: String,
    ordinal: u32,
    first_sequence: u64,
    first_artifact: String,
}

#[derive(Serialize)]
struct StagingInfo {
    input: String,
    temp_dir: String,
    compress: bool,
    camera: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!("Loading configuration info");

    let config = settings::resolve(&args.sim)?;
    let info = build_info(&config)?;

    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize info")?;
        println!("{}", json);
    } else {
        print_info(&info);
    }

    Ok(())
}

fn build_info(config: &SimulationConfig) -> Result<SimulationInfo> {
    let destination = transport::Destination::parse(&config.destination)?;
    let schedule = config.schedule()?;
    let plans = UnitPlan::from_config(config)?;
    let scheduler = ExposureScheduler::new(schedule);
    let obs_day = scheduler.obs_day();

    let units = plans
        .iter()
        .map(|plan| {
            let namer =
                ArtifactNamer::new(&plan.schedule, &plan.unit, plan.unit_count, plan.camera, obs_day);
            UnitInfo {
                sensor: plan.unit.sensor.to_string(),
                ordinal: plan.unit.ordinal,
                first_sequence: namer.base_sequence(),
                first_artifact: namer.artifact_path(0).to_string(),
            }
        })
        .collect::<Vec<_>>();
    let unit_count = u32::try_from(units.len()).unwrap_or(u32::MAX);

    Ok(SimulationInfo {
        version: format!("{:?}", config.version),
        destination: DestinationInfo {
            uri: config.destination.clone(),
            backend: destination.backend_name().to_string(),
            resolved: destination.to_string(),
        },
        schedule: ScheduleInfo {
            start_time: config.start_time.to_string(),
            interval_secs: config.interval_secs,
            num_exposures: config.num_exposures,
            first_trigger: scheduler.trigger_time(0).to_string(),
            obs_day: obs_day.dashed(),
            sequence_scale: sequence_scale(unit_count),
        },
        units,
        staging: StagingInfo {
            input: config.input.display().to_string(),
            temp_dir: config.temp_dir.display().to_string(),
            compress: config.compress,
            camera: config.camera.to_string(),
        },
        transport: config.transport.clone(),
    })
}

fn print_info(info: &SimulationInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 camxfer Simulation                           ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Destination");
    println!("   ├─ URI: {}", info.destination.uri);
    println!("   ├─ Backend: {}", info.destination.backend);
    println!("   └─ Target: {}", info.destination.resolved);

    let schedule = &info.schedule;
    println!("\n⏱️  Schedule");
    println!("   ├─ Start: {} (obs day {})", schedule.start_time, schedule.obs_day);
    println!("   ├─ First trigger: {}", schedule.first_trigger);
    println!(
        "   ├─ Exposures: {} every {}s",
        schedule.num_exposures, schedule.interval_secs
    );
    println!("   └─ Sequence scale: {}", schedule.sequence_scale);

    println!("\n📷 Units ({})", info.units.len());
    for (i, unit) in info.units.iter().enumerate() {
        let prefix = if i == info.units.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} #{} -> {}",
            prefix, unit.sensor, unit.ordinal, unit.first_artifact
        );
    }

    let staging = &info.staging;
    println!("\n📦 Staging");
    println!("   ├─ Input: {}", staging.input);
    println!("   ├─ Temp dir: {}", staging.temp_dir);
    println!("   ├─ Camera: {}", staging.camera);
    println!("   └─ Compress: {}", staging.compress);

    println!();
}
