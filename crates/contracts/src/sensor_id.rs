//! SensorId / UnitId - identity of a simulated sensor and its run unit
//!
//! `SensorId` wraps `Arc<str>` so it can be cloned into spans, paths and
//! reports without reallocating.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Sensor identifier as it appears in artifact names (e.g. `"3-0"`).
///
/// # Examples
/// ```
/// use contracts::SensorId;
///
/// let id: SensorId = "3-0".into();
/// assert_eq!(id.as_str(), "3-0");
/// assert_eq!(id.clone(), id);
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(Arc<str>);

impl SensorId {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Sensor id `<node>-<ccd>` used when only a count is configured
    pub fn for_node(node: u64, ccd: u32) -> Self {
        Self::from(format!("{node}-{ccd}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SensorId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for SensorId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SensorId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SensorId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SensorId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorId({:?})", self.0)
    }
}

impl Serialize for SensorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SensorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

/// Identity of one run unit: its sensor name plus its slot in the fan-out
///
/// The ordinal is distinct for every unit of a run and drives the sequence
/// number offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitId {
    pub sensor: SensorId,
    pub ordinal: u32,
}

impl UnitId {
    pub fn new(sensor: impl Into<SensorId>, ordinal: u32) -> Self {
        Self {
            sensor: sensor.into(),
            ordinal,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sensor)
    }
}
