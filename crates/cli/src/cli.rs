//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{CameraTag, StartTime};
use std::path::PathBuf;

/// camxfer - simulate a camera pushing exposures to remote storage
#[derive(Parser, Debug)]
#[command(
    name = "camxfer",
    author,
    version,
    about = "Simulated camera exposure transfer harness",
    long_about = "Simulates one or more sensors producing an image at fixed wall-clock times.\n\n\
                  Each exposure is copied into a private staging directory, optionally \n\
                  gzipped, and pushed to the destination selected by its URI scheme."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CAMXFER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CAMXFER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the exposure simulation
    Run(RunArgs),

    /// Validate the effective configuration without running
    Validate(ValidateArgs),

    /// Display the effective configuration and unit layout
    Info(InfoArgs),
}

/// Simulation settings shared by every command
///
/// Flags override values read from `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct SimulationArgs {
    /// Configuration file (TOML or JSON)
    #[arg(long, env = "CAMXFER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Destination URI (gs, s3, minio, file, http(s), scp, bbcp or host:path)
    #[arg(short, long, value_name = "URI", env = "CAMXFER_DESTINATION")]
    pub destination: Option<String>,

    /// Local time of the first exposure
    #[arg(short = 's', long, value_name = "HH:MM", env = "CAMXFER_STARTTIME")]
    pub starttime: Option<StartTime>,

    /// Number of exposures per sensor
    #[arg(short = 'n', long, value_name = "EXPOSURES", env = "CAMXFER_NUMEXP")]
    pub numexp: Option<u32>,

    /// Number of sensors to simulate
    #[arg(short = 'c', long, value_name = "CCDS", env = "CAMXFER_CCDS")]
    pub ccds: Option<u32>,

    /// Explicit sensor id (repeatable); replaces generated ids
    #[arg(long = "sensor", value_name = "ID")]
    pub sensors: Vec<String>,

    /// Seconds between exposures
    #[arg(short, long, value_name = "SECS", env = "CAMXFER_INTERVAL")]
    pub interval: Option<u64>,

    /// Source image, or directory of per-sensor images
    #[arg(short = 'I', long, value_name = "PATH", env = "CAMXFER_INPUTFILE")]
    pub inputfile: Option<PathBuf>,

    /// Root for per-sensor staging directories
    #[arg(short, long, value_name = "DIR", env = "CAMXFER_TEMPDIR")]
    pub tempdir: Option<PathBuf>,

    /// Gzip each exposure before transfer
    #[arg(short = 'z', long)]
    pub compress: bool,

    /// Camera abbreviation used in artifact names
    #[arg(long, value_name = "TAG", env = "CAMXFER_CAMERA")]
    pub camera: Option<CameraTag>,

    /// Enable TCP keepalive on backend connections
    #[arg(short = 'K', long)]
    pub keepalive: bool,

    /// Node number for generated sensor ids (default: from the host name)
    #[arg(long, env = "CAMXFER_NODE")]
    pub node: Option<u64>,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub sim: SimulationArgs,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CAMXFER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Resolve configuration and print the unit layout without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub sim: SimulationArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub sim: SimulationArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
