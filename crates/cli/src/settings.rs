//! Effective configuration: optional file, then command-line overrides.

use anyhow::{Context, Result};
use contracts::{SensorId, SimulationConfig};
use tracing::{debug, info};

use crate::cli::SimulationArgs;

/// Idle time applied by `--keepalive`
const KEEPALIVE_SECS: u64 = 1;

/// Build and validate the configuration described by `args`
///
/// Without `--config`, destination, start time and exposure count must be
/// given on the command line.
pub fn resolve(args: &SimulationArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            let destination = args
                .destination
                .clone()
                .context("--destination is required without --config")?;
            let start = args
                .starttime
                .context("--starttime is required without --config")?;
            let numexp = args
                .numexp
                .context("--numexp is required without --config")?;
            let mut config = SimulationConfig::new(destination, start, numexp);
            config.sensors.node = args.node.unwrap_or_else(runner::local_node_number);
            config
        }
    };

    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config).context("Invalid configuration")?;
    transport::Destination::parse(&config.destination)
        .with_context(|| format!("Unusable destination '{}'", config.destination))?;

    debug!(
        destination = %config.destination,
        start = %config.start_time,
        exposures = config.num_exposures,
        sensors = config.sensors.len(),
        "Configuration resolved"
    );
    Ok(config)
}

fn apply_overrides(config: &mut SimulationConfig, args: &SimulationArgs) {
    if let Some(destination) = &args.destination {
        config.destination = destination.clone();
    }
    if let Some(start) = args.starttime {
        config.start_time = start;
    }
    if let Some(numexp) = args.numexp {
        config.num_exposures = numexp;
    }
    if let Some(ccds) = args.ccds {
        config.sensors.count = ccds;
    }
    if !args.sensors.is_empty() {
        config.sensors.ids = args.sensors.iter().map(|s| SensorId::new(s)).collect();
    }
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }
    if let Some(input) = &args.inputfile {
        config.input = input.clone();
    }
    if let Some(tempdir) = &args.tempdir {
        config.temp_dir = tempdir.clone();
    }
    if args.compress {
        config.compress = true;
    }
    if let Some(camera) = args.camera {
        config.camera = camera;
    }
    if args.keepalive && config.transport.tcp_keepalive_secs.is_none() {
        config.transport.tcp_keepalive_secs = Some(KEEPALIVE_SECS);
    }
    if let Some(node) = args.node {
        config.sensors.node = node;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CameraTag, StartTime};
    use std::io::Write;

    fn required() -> SimulationArgs {
        SimulationArgs {
            destination: Some("https://example.org/upload".to_string()),
            starttime: Some(StartTime::new(10, 0).unwrap()),
            numexp: Some(3),
            node: Some(5),
            ..SimulationArgs::default()
        }
    }

    #[test]
    fn test_flags_only() {
        let config = resolve(&required()).unwrap();
        assert_eq!(config.num_exposures, 3);
        assert_eq!(config.interval_secs, 17);
        assert_eq!(config.unit_ids()[0].sensor.as_str(), "5-0");
    }

    #[test]
    fn test_missing_required_flag() {
        let args = SimulationArgs {
            numexp: None,
            ..required()
        };
        let err = resolve(&args).unwrap_err();
        assert!(err.to_string().contains("--numexp"));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
destination = "gs://bucket/raw"
start_time = "22:30"
num_exposures = 10
camera = "AT"

[sensors]
node = 3
count = 2
"#
        )
        .unwrap();

        let args = SimulationArgs {
            config: Some(file.path().to_path_buf()),
            numexp: Some(4),
            camera: Some(CameraTag::Cc),
            keepalive: true,
            ..SimulationArgs::default()
        };
        let config = resolve(&args).unwrap();
        assert_eq!(config.destination, "gs://bucket/raw");
        assert_eq!(config.start_time, StartTime::new(22, 30).unwrap());
        assert_eq!(config.num_exposures, 4);
        assert_eq!(config.camera, CameraTag::Cc);
        assert_eq!(config.sensors.node, 3);
        assert_eq!(config.transport.tcp_keepalive_secs, Some(KEEPALIVE_SECS));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let args = SimulationArgs {
            destination: Some("ftp://example.org/x".to_string()),
            ..required()
        };
        assert!(resolve(&args).is_err());
    }

    #[test]
    fn test_explicit_sensors() {
        let args = SimulationArgs {
            sensors: vec!["R22_S11".to_string(), "R22_S12".to_string()],
            ..required()
        };
        let ids = resolve(&args).unwrap().unit_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1].sensor.as_str(), "R22_S12");
        assert_eq!(ids[1].ordinal, 1);
    }
}
