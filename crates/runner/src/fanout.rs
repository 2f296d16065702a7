//! FanOut - one task per unit, joined at the end

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use exposure::{Clock, SystemClock};
use observability::{RunningStats, StatsSummary};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::error::{Result, RunnerError};
use crate::factory::BackendFactory;
use crate::unit::{run_unit, UnitPlan, UnitReport, UnitState};

/// Runs independent units concurrently
///
/// The parent only spawns and joins; it does no file or network I/O.
pub struct FanOut<F, C = SystemClock> {
    plans: Vec<UnitPlan>,
    factory: Arc<F>,
    clock: C,
}

impl<F: BackendFactory + Sync + 'static> FanOut<F> {
    /// # Errors
    /// `NoUnits` when `plans` is empty
    pub fn new(plans: Vec<UnitPlan>, factory: F) -> Result<Self> {
        Self::with_clock(plans, factory, SystemClock)
    }
}

impl<F, C> FanOut<F, C>
where
    F: BackendFactory + Sync + 'static,
    C: Clock + Clone + 'static,
{
    pub fn with_clock(plans: Vec<UnitPlan>, factory: F, clock: C) -> Result<Self> {
        if plans.is_empty() {
            return Err(RunnerError::NoUnits);
        }
        Ok(Self {
            plans,
            factory: Arc::new(factory),
            clock,
        })
    }

    pub fn units(&self) -> usize {
        self.plans.len()
    }

    /// Spawn every unit and wait for all of them
    ///
    /// Unit failures are inside the reports; a panicked task is logged and
    /// counted, never propagated.
    pub async fn run(self) -> FanOutReport {
        let started = Instant::now();
        info!(units = self.plans.len(), "Starting units");

        let handles: Vec<(String, JoinHandle<UnitReport>)> = self
            .plans
            .into_iter()
            .map(|plan| {
                let name = plan.unit.to_string();
                let span = info_span!("unit", unit = %plan.unit);
                let factory = Arc::clone(&self.factory);
                let clock = self.clock.clone();
                let handle = tokio::spawn(
                    async move { run_unit(plan, factory.as_ref(), clock).await }.instrument(span),
                );
                (name, handle)
            })
            .collect();

        let mut report = FanOutReport::default();
        for (unit, handle) in handles {
            match handle.await {
                Ok(unit_report) => report.units.push(unit_report),
                Err(e) => {
                    error!(unit = %unit, error = %e, "Unit task failed");
                    report
                        .join_failures
                        .push(RunnerError::unit_task(unit, e.to_string()));
                }
            }
        }
        report.elapsed = started.elapsed();

        info!(
            joined = report.joined(),
            join_failures = report.join_failures.len(),
            transferred = report.transferred(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "All units finished"
        );
        report
    }
}

/// Aggregate outcome of a fan-out
#[derive(Debug, Default)]
pub struct FanOutReport {
    /// Reports of joined units, in spawn order
    pub units: Vec<UnitReport>,
    /// Units whose task panicked or was cancelled
    pub join_failures: Vec<RunnerError>,
    pub elapsed: Duration,
}

impl FanOutReport {
    pub fn joined(&self) -> usize {
        self.units.len()
    }

    pub fn aborted(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.state == UnitState::Aborted)
            .count()
    }

    pub fn transferred(&self) -> u64 {
        self.units.iter().map(|u| u64::from(u.transferred)).sum()
    }

    pub fn failures(&self) -> u64 {
        self.units
            .iter()
            .map(|u| u64::from(u.staging_failures + u.transfer_failures))
            .sum()
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.units.iter().map(|u| u.bytes_transferred).sum()
    }

    /// Transfer durations across all units
    pub fn transfer_ms(&self) -> StatsSummary {
        let mut all = RunningStats::default();
        for unit in &self.units {
            all.merge(&unit.transfer_ms);
        }
        StatsSummary::from(&all)
    }
}

impl fmt::Display for FanOutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "units joined: {} (aborted {}, task failures {})",
            self.joined(),
            self.aborted(),
            self.join_failures.len()
        )?;
        writeln!(
            f,
            "transferred: {} ({} bytes), skipped exposures: {}",
            self.transferred(),
            self.bytes_transferred(),
            self.failures()
        )?;
        write!(f, "transfer ms: {}", self.transfer_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{plan_for, MockFactory};
    use chrono::{NaiveDate, TimeDelta};
    use contracts::{ScheduleSpec, StartTime, UnitId};
    use exposure::{FixedClock, OffsetClock};
    use std::collections::{HashMap, HashSet};

    fn at_noon() -> FixedClock {
        FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    fn plans(dir: &std::path::Path, count: u32, exposures: u32) -> Vec<UnitPlan> {
        let input = dir.join("S00.fits");
        std::fs::write(&input, b"SIMPLE").unwrap();
        (0..count)
            .map(|ccd| plan_for(UnitId::new(format!("0-{ccd}"), ccd), count, exposures, &input, dir))
            .collect()
    }

    #[test]
    fn test_no_units() {
        let result = FanOut::new(Vec::new(), MockFactory::default());
        assert!(matches!(result, Err(RunnerError::NoUnits)));
    }

    #[tokio::test]
    async fn test_four_units_distinct_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockFactory::default();
        let log = factory.log.clone();

        let report = FanOut::with_clock(plans(dir.path(), 4, 3), factory, at_noon())
            .unwrap()
            .run()
            .await;

        assert_eq!(report.joined(), 4);
        assert_eq!(report.transferred(), 12);
        assert!(report.join_failures.is_empty());

        let log = log.lock().unwrap();
        let mut first: HashMap<&str, u64> = HashMap::new();
        for delivery in log.iter() {
            first
                .entry(delivery.unit.as_str())
                .or_insert(delivery.artifact.sequence());
        }
        let bases: HashSet<u64> = first.values().copied().collect();
        assert_eq!(bases.len(), 4);

        let all: HashSet<&str> = log.iter().map(|d| d.artifact.as_str()).collect();
        assert_eq!(all.len(), 12);
    }

    #[tokio::test]
    async fn test_aborted_unit_still_joins() {
        let dir = tempfile::tempdir().unwrap();
        let report = FanOut::with_clock(plans(dir.path(), 2, 1), MockFactory::refusing(), at_noon())
            .unwrap()
            .run()
            .await;

        assert_eq!(report.joined(), 2);
        assert_eq!(report.aborted(), 2);
        assert!(report.join_failures.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_unit_is_counted_not_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let report = FanOut::with_clock(
            plans(dir.path(), 3, 1),
            MockFactory::panicking_for("0-1"),
            at_noon(),
        )
        .unwrap()
        .run()
        .await;

        assert_eq!(report.joined(), 2);
        assert_eq!(report.join_failures.len(), 1);
        assert!(report.join_failures[0].to_string().contains("0-1"));
    }

    #[tokio::test]
    async fn test_slow_transfer_does_not_delay_other_units() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("S00.fits");
        std::fs::write(&input, b"SIMPLE").unwrap();

        let schedule =
            ScheduleSpec::with_interval(StartTime::new(10, 0).unwrap(), Duration::from_millis(50))
                .unwrap();
        let plans: Vec<UnitPlan> = (0..2)
            .map(|ccd| UnitPlan {
                schedule,
                ..plan_for(UnitId::new(format!("0-{ccd}"), ccd), 2, 3, &input, dir.path())
            })
            .collect();

        // just before 10:00 so every exposure is waited for
        let clock = OffsetClock::starting_at(
            NaiveDate::from_ymd_opt(2024, 3, 7)
                .unwrap()
                .and_hms_opt(9, 59, 59)
                .unwrap()
                + TimeDelta::milliseconds(950),
        );
        let factory = MockFactory::slow_for("0-0", Duration::from_millis(400));
        let log = factory.log.clone();

        let started = Instant::now();
        let report = FanOut::with_clock(plans, factory, clock)
            .unwrap()
            .run()
            .await;
        assert_eq!(report.transferred(), 6);

        let log = log.lock().unwrap();
        let fast_last = log
            .iter()
            .filter(|d| d.unit == "0-1")
            .map(|d| d.at)
            .max()
            .unwrap();
        let slow_first = log
            .iter()
            .filter(|d| d.unit == "0-0")
            .map(|d| d.at)
            .min()
            .unwrap();

        // unit 0-1 finished all three exposures before unit 0-0's first transfer returned
        assert!(fast_last < slow_first);
        assert!(fast_last.duration_since(started) < Duration::from_millis(400));
    }

    #[test]
    fn test_report_display() {
        let report = FanOutReport::default();
        let text = report.to_string();
        assert!(text.contains("units joined: 0"));
        assert!(text.contains("transfer ms: N/A"));
    }
}
