//! Sequence numbers and destination paths for one unit

use contracts::{ArtifactPath, CameraTag, ObsDay, ScheduleSpec, SensorId, UnitId};

/// Deterministic artifact naming for one unit
///
/// `sequence(index) = HHMM * scale + ordinal + index`, where `scale` is the
/// smallest power of ten that is at least `max(10, unit_count)`.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    base_sequence: u64,
    camera: CameraTag,
    sensor: SensorId,
    obs_day: ObsDay,
}

impl ArtifactNamer {
    pub fn new(
        schedule: &ScheduleSpec,
        unit: &UnitId,
        unit_count: u32,
        camera: CameraTag,
        obs_day: ObsDay,
    ) -> Self {
        // ordinals past unit_count would collide with the next HHMM slot
        let span = unit_count.max(unit.ordinal.saturating_add(1));
        let scale = sequence_scale(span);
        Self {
            base_sequence: schedule.start().hhmm() * scale + u64::from(unit.ordinal),
            camera,
            sensor: unit.sensor.clone(),
            obs_day,
        }
    }

    pub fn base_sequence(&self) -> u64 {
        self.base_sequence
    }

    pub fn obs_day(&self) -> ObsDay {
        self.obs_day
    }

    pub fn sequence(&self, index: u32) -> u64 {
        self.base_sequence + u64::from(index)
    }

    /// Destination-relative path for exposure `index`
    pub fn artifact_path(&self, index: u32) -> ArtifactPath {
        ArtifactPath::new(
            self.obs_day,
            self.sequence(index),
            self.camera,
            self.sensor.as_str(),
        )
    }
}

/// Smallest power of ten `>= max(10, unit_count)`
pub fn sequence_scale(unit_count: u32) -> u64 {
    let target = u64::from(unit_count).max(10);
    let mut scale = 10;
    while scale < target {
        scale *= 10;
    }
    scale
}
