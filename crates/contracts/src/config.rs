//! SimulationConfig - typed configuration consumed by the core
//!
//! Produced by the config loader (TOML/JSON) and/or the CLI; describes the
//! destination, schedule, sensors, input image and transport tuning.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    CameraTag, ContractError, ScheduleSpec, SensorId, StartTime, UnitId, DEFAULT_INTERVAL_SECS,
};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Destination URI; its scheme selects the transport backend
    pub destination: String,

    /// Local time of the first exposure
    pub start_time: StartTime,

    /// Exposures per unit
    pub num_exposures: u32,

    /// Seconds between exposures
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Simulated sensors (one unit each)
    #[serde(default)]
    pub sensors: SensorSet,

    /// Camera abbreviation used in file names
    #[serde(default)]
    pub camera: CameraTag,

    /// Source image file, or directory of per-sensor images
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Root under which each unit creates its staging directory
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Gzip artifacts before transfer
    #[serde(default)]
    pub compress: bool,

    /// Backend tuning
    #[serde(default)]
    pub transport: TransportOptions,
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_input() -> PathBuf {
    PathBuf::from("./data/S00.fits")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

impl SimulationConfig {
    /// Configuration with defaults for everything but the required fields
    pub fn new(destination: impl Into<String>, start_time: StartTime, num_exposures: u32) -> Self {
        Self {
            version: ConfigVersion::V1,
            destination: destination.into(),
            start_time,
            num_exposures,
            interval_secs: DEFAULT_INTERVAL_SECS,
            sensors: SensorSet::default(),
            camera: CameraTag::default(),
            input: default_input(),
            temp_dir: default_temp_dir(),
            compress: false,
            transport: TransportOptions::default(),
        }
    }

    /// Schedule shared by every unit
    pub fn schedule(&self) -> Result<ScheduleSpec, ContractError> {
        ScheduleSpec::new(self.start_time, self.interval_secs)
    }

    /// Unit identities in fan-out order
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.sensors.unit_ids()
    }
}

/// Which sensors to simulate
///
/// Explicit `ids` win; otherwise `count` ids of the form `<node>-<ccd>` are
/// generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSet {
    /// Node number used in generated ids
    #[serde(default)]
    pub node: u64,

    /// Number of sensors to generate when `ids` is empty
    #[serde(default = "default_sensor_count")]
    pub count: u32,

    /// Explicit sensor ids
    #[serde(default)]
    pub ids: Vec<SensorId>,
}

fn default_sensor_count() -> u32 {
    1
}

impl Default for SensorSet {
    fn default() -> Self {
        Self {
            node: 0,
            count: default_sensor_count(),
            ids: Vec::new(),
        }
    }
}

impl SensorSet {
    pub fn unit_ids(&self) -> Vec<UnitId> {
        if self.ids.is_empty() {
            (0..self.count)
                .map(|ccd| UnitId::new(SensorId::for_node(self.node, ccd), ccd))
                .collect()
        } else {
            self.ids
                .iter()
                .zip(0u32..)
                .map(|(id, ordinal)| UnitId::new(id.clone(), ordinal))
                .collect()
        }
    }

    pub fn len(&self) -> usize {
        if self.ids.is_empty() {
            self.count as usize
        } else {
            self.ids.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-backend connection settings, passed explicitly into construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Enable TCP keepalive with this idle time (seconds)
    #[serde(default)]
    pub tcp_keepalive_secs: Option<u64>,

    /// Whole-request timeout (seconds)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Connection establishment timeout (seconds)
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Write a zero-byte probe object when an object-store backend is built
    #[serde(default = "default_true")]
    pub prime_object_store: bool,

    /// Program used for `scp://` and `host:path` destinations
    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,

    /// Program used for `bbcp://` destinations
    #[serde(default = "default_bbcp_program")]
    pub bbcp_program: String,
}

fn default_true() -> bool {
    true
}

fn default_ssh_program() -> String {
    "ssh".to_string()
}

fn default_bbcp_program() -> String {
    "bbcp".to_string()
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: None,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            prime_object_store: true,
            ssh_program: default_ssh_program(),
            bbcp_program: default_bbcp_program(),
        }
    }
}

impl TransportOptions {
    pub fn tcp_keepalive(&self) -> Option<Duration> {
        self.tcp_keepalive_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_unit_ids() {
        let sensors = SensorSet {
            node: 7,
            count: 3,
            ids: Vec::new(),
        };
        let ids = sensors.unit_ids();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[2].sensor.as_str(), "7-2");
        assert_eq!(ids[2].ordinal, 2);
    }

    #[test]
    fn test_explicit_ids_win() {
        let sensors = SensorSet {
            node: 7,
            count: 9,
            ids: vec!["R00-S00".into(), "R00-S01".into()],
        };
        let ids = sensors.unit_ids();
        assert_eq!(sensors.len(), 2);
        assert_eq!(ids[1].sensor.as_str(), "R00-S01");
        assert_eq!(ids[1].ordinal, 1);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
destination = "http://example/bucket"
start_time = "10:00"
num_exposures = 3
"#,
        )
        .unwrap();
        assert_eq!(config.interval_secs, 17);
        assert_eq!(config.camera, CameraTag::Mc);
        assert_eq!(config.sensors.count, 1);
        assert!(config.transport.prime_object_store);
        assert_eq!(config.transport.ssh_program, "ssh");
        assert_eq!(config.schedule().unwrap().start().hhmm(), 1000);
    }
}
