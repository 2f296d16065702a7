//! 配置校验模块
//!
//! 校验规则：
//! - interval_secs > 0
//! - num_exposures > 0
//! - 至少一个传感器, sensor_id 唯一且非空
//! - destination 非空
//! - 显式超时 > 0

use std::collections::HashSet;

use contracts::{ContractError, SimulationConfig};

/// 校验 SimulationConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &SimulationConfig) -> Result<(), ContractError> {
    validate_schedule(config)?;
    validate_sensors(config)?;
    validate_destination(config)?;
    validate_transport(config)?;
    Ok(())
}

fn validate_schedule(config: &SimulationConfig) -> Result<(), ContractError> {
    config.schedule()?;
    if config.num_exposures == 0 {
        return Err(ContractError::config_validation(
            "num_exposures",
            "num_exposures must be > 0",
        ));
    }
    Ok(())
}

/// 校验 sensor_id 唯一性
fn validate_sensors(config: &SimulationConfig) -> Result<(), ContractError> {
    if config.sensors.is_empty() {
        return Err(ContractError::config_validation(
            "sensors",
            "at least one sensor is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, id) in config.sensors.ids.iter().enumerate() {
        if id.is_empty() || id.contains('/') {
            return Err(ContractError::config_validation(
                format!("sensors.ids[{idx}]"),
                format!("invalid sensor id '{id}'"),
            ));
        }
        if !seen.insert(id.as_str()) {
            return Err(ContractError::config_validation(
                format!("sensors.ids[id={id}]"),
                "duplicate sensor_id",
            ));
        }
    }
    Ok(())
}

fn validate_destination(config: &SimulationConfig) -> Result<(), ContractError> {
    if config.destination.trim().is_empty() {
        return Err(ContractError::config_validation(
            "destination",
            "destination cannot be empty",
        ));
    }
    Ok(())
}

fn validate_transport(config: &SimulationConfig) -> Result<(), ContractError> {
    let transport = &config.transport;
    let timeouts = [
        ("transport.tcp_keepalive_secs", transport.tcp_keepalive_secs),
        ("transport.request_timeout_secs", transport.request_timeout_secs),
        ("transport.connect_timeout_secs", transport.connect_timeout_secs),
    ];
    for (field, value) in timeouts {
        if value == Some(0) {
            return Err(ContractError::config_validation(field, "must be > 0 when set"));
        }
    }
    if transport.ssh_program.is_empty() || transport.bbcp_program.is_empty() {
        return Err(ContractError::config_validation(
            "transport",
            "remote copy program names cannot be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SensorSet, StartTime};

    fn sample_config() -> SimulationConfig {
        SimulationConfig::new("http://example/bucket", StartTime::new(10, 0).unwrap(), 3)
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&sample_config()).is_ok());
    }

    #[test]
    fn test_zero_interval() {
        let mut config = sample_config();
        config.interval_secs = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn test_zero_exposures() {
        let mut config = sample_config();
        config.num_exposures = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_no_sensors() {
        let mut config = sample_config();
        config.sensors = SensorSet {
            node: 0,
            count: 0,
            ids: Vec::new(),
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_sensor_ids() {
        let mut config = sample_config();
        config.sensors.ids = vec!["0-0".into(), "0-0".into()];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_empty_destination() {
        let mut config = sample_config();
        config.destination = "  ".into();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = sample_config();
        config.transport.request_timeout_secs = Some(0);
        assert!(validate(&config).is_err());
    }
}
