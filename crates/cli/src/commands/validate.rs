//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::SimulationConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::settings;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    destination: String,
    backend: String,
    start_time: String,
    num_exposures: u32,
    interval_secs: u64,
    sensor_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!("Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.sim.config.as_ref().map(|p| p.display().to_string());

    match settings::resolve(&args.sim) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let backend = transport::Destination::parse(&config.destination)
                .map(|d| d.backend_name().to_string())
                .unwrap_or_default();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    destination: config.destination.clone(),
                    backend,
                    start_time: config.start_time.to_string(),
                    num_exposures: config.num_exposures,
                    interval_secs: config.interval_secs,
                    sensor_count: config.sensors.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("{e:#}")),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SimulationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.input.exists() {
        warnings.push(format!(
            "Input {} does not exist - every unit will abort",
            config.input.display()
        ));
    }

    if !config.temp_dir.is_dir() {
        warnings.push(format!(
            "Temporary directory {} does not exist",
            config.temp_dir.display()
        ));
    }

    if config.sensors.len() > 1 && config.interval_secs < 2 {
        warnings.push(format!(
            "{} sensors sharing a {}s interval will likely run late",
            config.sensors.len(),
            config.interval_secs
        ));
    }

    if !config.sensors.ids.is_empty() && config.sensors.count != 1 {
        warnings.push("sensors.count is ignored when sensors.ids is set".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    let source = result.config_path.as_deref().unwrap_or("command line");
    if result.valid {
        println!("✓ Configuration is valid: {}", source);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Destination: {} ({})", summary.destination, summary.backend);
            println!("  Start: {}", summary.start_time);
            println!(
                "  Exposures: {} every {}s",
                summary.num_exposures, summary.interval_secs
            );
            println!("  Sensors: {}", summary.sensor_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
