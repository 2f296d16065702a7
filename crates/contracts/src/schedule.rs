//! ScheduleSpec - when exposures fire

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Default cadence between exposures (seconds)
pub const DEFAULT_INTERVAL_SECS: u64 = 17;

/// Local time-of-day of the first exposure (`HH:MM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StartTime {
    hour: u32,
    minute: u32,
}

impl StartTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ContractError> {
        if hour > 23 {
            return Err(ContractError::config_validation(
                "start_time",
                format!("hour must be in 0..=23, got {hour}"),
            ));
        }
        if minute > 59 {
            return Err(ContractError::config_validation(
                "start_time",
                format!("minute must be in 0..=59, got {minute}"),
            ));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Hour and minute digits concatenated (`10:05` -> `1005`)
    pub fn hhmm(&self) -> u64 {
        u64::from(self.hour) * 100 + u64::from(self.minute)
    }
}

impl FromStr for StartTime {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s.trim().split_once(':').ok_or_else(|| {
            ContractError::config_validation("start_time", format!("expected HH:MM, got '{s}'"))
        })?;
        let parse = |part: &str, what: &str| {
            part.parse::<u32>().map_err(|_| {
                ContractError::config_validation(
                    "start_time",
                    format!("invalid {what} '{part}' in '{s}'"),
                )
            })
        };
        Self::new(parse(hour, "hour")?, parse(minute, "minute")?)
    }
}

impl TryFrom<String> for StartTime {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StartTime> for String {
    fn from(value: StartTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for StartTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Start time plus cadence; immutable once a unit starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSpec {
    start: StartTime,
    interval: Duration,
}

impl ScheduleSpec {
    /// Create a schedule with a whole-second interval
    ///
    /// # Errors
    /// `interval_secs` must be > 0
    pub fn new(start: StartTime, interval_secs: u64) -> Result<Self, ContractError> {
        if interval_secs == 0 {
            return Err(ContractError::config_validation(
                "interval_secs",
                "interval_secs must be > 0",
            ));
        }
        Ok(Self {
            start,
            interval: Duration::from_secs(interval_secs),
        })
    }

    /// Create a schedule with a sub-second interval (tests and demos)
    pub fn with_interval(start: StartTime, interval: Duration) -> Result<Self, ContractError> {
        if interval.is_zero() {
            return Err(ContractError::config_validation(
                "interval_secs",
                "interval must be > 0",
            ));
        }
        Ok(Self { start, interval })
    }

    pub fn start(&self) -> StartTime {
        self.start
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
