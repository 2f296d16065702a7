//! Wall-clock exposure scheduler

use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use contracts::{ObsDay, ScheduleSpec};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};

/// Result of waiting for one exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Target was in the future; the unit slept this long
    OnTime { slept: Duration },
    /// Target had already passed by this much; nothing was slept
    Late { by: Duration },
}

impl WaitOutcome {
    pub fn is_late(&self) -> bool {
        matches!(self, Self::Late { .. })
    }
}

/// Computes and waits for `base + index * interval`
///
/// `base` is today's `HH:MM:00` as seen by the clock when the scheduler is
/// built. A base earlier than "now" is not moved to tomorrow.
#[derive(Debug)]
pub struct ExposureScheduler<C = SystemClock> {
    spec: ScheduleSpec,
    clock: C,
    base: NaiveDateTime,
}

impl ExposureScheduler<SystemClock> {
    pub fn new(spec: ScheduleSpec) -> Self {
        Self::with_clock(spec, SystemClock)
    }
}

impl<C: Clock> ExposureScheduler<C> {
    /// Create a scheduler on an explicit clock
    pub fn with_clock(spec: ScheduleSpec, clock: C) -> Self {
        let start = spec.start();
        let minutes = i64::from(start.hour()) * 60 + i64::from(start.minute());
        let base = clock.now().date().and_time(NaiveTime::MIN) + TimeDelta::minutes(minutes);
        Self { spec, clock, base }
    }

    pub fn spec(&self) -> &ScheduleSpec {
        &self.spec
    }

    /// Absolute instant of exposure 0
    pub fn base(&self) -> NaiveDateTime {
        self.base
    }

    /// Observation day of this run; fixed at construction
    pub fn obs_day(&self) -> ObsDay {
        ObsDay::new(self.base.date())
    }

    /// Absolute trigger instant of exposure `index`
    pub fn trigger_time(&self, index: u32) -> NaiveDateTime {
        TimeDelta::from_std(self.spec.interval().saturating_mul(index))
            .ok()
            .and_then(|offset| self.base.checked_add_signed(offset))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// What `wait_for(index)` would do if called now, without sleeping
    pub fn plan(&self, index: u32) -> WaitOutcome {
        let delta = self.trigger_time(index) - self.clock.now();
        match delta.to_std() {
            Ok(slept) => WaitOutcome::OnTime { slept },
            Err(_) => WaitOutcome::Late {
                by: (-delta).to_std().unwrap_or_default(),
            },
        }
    }

    /// Suspend until exposure `index` is due
    ///
    /// The delay is read from the wall clock once and then slept on tokio's
    /// monotonic timer. A past target returns immediately as `Late`.
    pub async fn wait_for(&self, index: u32) -> WaitOutcome {
        let outcome = self.plan(index);
        match outcome {
            WaitOutcome::OnTime { slept } => {
                debug!(
                    index,
                    target = %self.trigger_time(index),
                    sleep_ms = slept.as_millis() as u64,
                    "Sleeping until exposure"
                );
                tokio::time::sleep(slept).await;
            }
            WaitOutcome::Late { by } => {
                warn!(
                    index,
                    target = %self.trigger_time(index),
                    late_ms = by.as_millis() as u64,
                    "Late"
                );
                observability::record_exposure_late(by.as_secs_f64());
            }
        }
        outcome
    }
}
