//! Wall-clock sources
//!
//! Times are local naive date-times: the schedule is expressed as a local
//! `HH:MM`, and file names carry the local date.

use chrono::{Local, NaiveDateTime, TimeDelta};

/// Source of "now" for the scheduler
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(NaiveDateTime);

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// System clock shifted so that it read `start` when it was created
///
/// Advances in real time afterwards, which lets a run "start" a few
/// milliseconds before any wall-clock `HH:MM`.
#[derive(Debug, Clone, Copy)]
pub struct OffsetClock {
    offset: TimeDelta,
}

impl OffsetClock {
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            offset: start - Local::now().naive_local(),
        }
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local() + self.offset
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
