//! ExposureUnit - one simulated sensor
//!
//! `Starting → (WaitExposure → Stage → Transfer)* → Done`, or
//! `Starting → Aborted` when setup fails.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use contracts::{
    CameraTag, ContractError, ScheduleSpec, SimulationConfig, TransportBackend, UnitId,
};
use exposure::{ArtifactNamer, Clock, ExposureScheduler, WaitOutcome};
use observability::RunningStats;
use staging::{resolve_input, StagingArea};
use tracing::{debug, error, info};

use crate::factory::BackendFactory;

/// Lifecycle state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Starting,
    WaitExposure,
    Stage,
    Transfer,
    Done,
    Aborted,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Everything one unit needs, derived from the shared configuration
#[derive(Debug, Clone)]
pub struct UnitPlan {
    pub unit: UnitId,
    pub unit_count: u32,
    pub schedule: ScheduleSpec,
    pub num_exposures: u32,
    pub camera: CameraTag,
    pub input: PathBuf,
    pub temp_root: PathBuf,
    pub compress: bool,
}

impl UnitPlan {
    /// One plan per configured sensor, in fan-out order
    pub fn from_config(config: &SimulationConfig) -> Result<Vec<Self>, ContractError> {
        let schedule = config.schedule()?;
        let units = config.unit_ids();
        let unit_count = u32::try_from(units.len())
            .map_err(|_| ContractError::config_validation("sensors", "too many sensors"))?;

        Ok(units
            .into_iter()
            .map(|unit| Self {
                unit,
                unit_count,
                schedule,
                num_exposures: config.num_exposures,
                camera: config.camera,
                input: config.input.clone(),
                temp_root: config.temp_dir.clone(),
                compress: config.compress,
            })
            .collect())
    }
}

/// Outcome of one unit
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub unit: UnitId,
    pub state: UnitState,
    /// Exposures whose wait completed
    pub exposures: u32,
    pub staged: u32,
    pub staging_failures: u32,
    pub transferred: u32,
    pub transfer_failures: u32,
    pub late: u32,
    pub first_sequence: Option<u64>,
    pub last_sequence: Option<u64>,
    pub transfer_ms: RunningStats,
    pub bytes_transferred: u64,
    /// Fatal setup error, when aborted
    pub error: Option<String>,
}

impl UnitReport {
    fn new(unit: UnitId) -> Self {
        Self {
            unit,
            state: UnitState::Starting,
            exposures: 0,
            staged: 0,
            staging_failures: 0,
            transferred: 0,
            transfer_failures: 0,
            late: 0,
            first_sequence: None,
            last_sequence: None,
            transfer_ms: RunningStats::default(),
            bytes_transferred: 0,
            error: None,
        }
    }

    fn aborted(unit: UnitId, err: &ContractError) -> Self {
        Self {
            state: UnitState::Aborted,
            error: Some(err.to_string()),
            ..Self::new(unit)
        }
    }
}

impl fmt::Display for UnitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?}, staged {}/{}, transferred {} ({} failed), late {}",
            self.unit,
            self.state,
            self.staged,
            self.exposures,
            self.transferred,
            self.transfer_failures,
            self.late
        )?;
        if let Some(err) = &self.error {
            write!(f, ", error: {err}")?;
        }
        Ok(())
    }
}

/// A unit past `Starting`: input resolved, staging area and backend built
pub struct ExposureUnit<B, C> {
    plan: UnitPlan,
    input: PathBuf,
    staging: StagingArea,
    backend: B,
    scheduler: ExposureScheduler<C>,
    namer: ArtifactNamer,
    state: UnitState,
}

impl<B: TransportBackend, C: Clock> ExposureUnit<B, C> {
    /// Set up a unit; the schedule base and obs-day are fixed here
    ///
    /// # Errors
    /// Missing input or an unusable temp root (configuration kind)
    pub fn new(plan: UnitPlan, backend: B, clock: C) -> Result<Self, ContractError> {
        let input = resolve_input(&plan.input, &plan.unit.sensor)?;
        let staging = StagingArea::create(&plan.temp_root, &plan.unit)?;
        let scheduler = ExposureScheduler::with_clock(plan.schedule, clock);
        let namer = ArtifactNamer::new(
            &plan.schedule,
            &plan.unit,
            plan.unit_count,
            plan.camera,
            scheduler.obs_day(),
        );

        info!(
            input = %input.display(),
            staging = %staging.path().display(),
            backend = backend.name(),
            base = %scheduler.base(),
            base_sequence = namer.base_sequence(),
            exposures = plan.num_exposures,
            "Unit ready"
        );

        Ok(Self {
            plan,
            input,
            staging,
            backend,
            scheduler,
            namer,
            state: UnitState::Starting,
        })
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn namer(&self) -> &ArtifactNamer {
        &self.namer
    }

    fn transition(&mut self, next: UnitState) {
        debug!(from = ?self.state, to = ?next, "Unit state");
        self.state = next;
    }

    /// Run every exposure in order, then drop the staging area
    ///
    /// Staging and transfer failures skip that exposure only.
    pub async fn run(mut self) -> UnitReport {
        let mut report = UnitReport::new(self.plan.unit.clone());
        let unit_name = self.plan.unit.sensor.to_string();

        for index in 0..self.plan.num_exposures {
            self.transition(UnitState::WaitExposure);
            if let WaitOutcome::Late { .. } = self.scheduler.wait_for(index).await {
                report.late += 1;
            }
            report.exposures += 1;
            observability::record_exposure(&unit_name);

            let artifact = self.namer.artifact_path(index);
            report.first_sequence.get_or_insert(artifact.sequence());
            report.last_sequence = Some(artifact.sequence());
            info!(index, sequence = artifact.sequence(), artifact = %artifact, "Exposure");

            self.transition(UnitState::Stage);
            let staged = match self
                .staging
                .stage(&self.input, &artifact, self.plan.compress)
                .await
            {
                Ok(staged) => {
                    report.staged += 1;
                    staged
                }
                Err(e) => {
                    report.staging_failures += 1;
                    error!(index, artifact = %artifact, error = %e, "Staging failed, skipping exposure");
                    continue;
                }
            };

            self.transition(UnitState::Transfer);
            let started = Instant::now();
            let result = self
                .backend
                .transfer(&staged.local, &staged.artifact)
                .await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            observability::record_transfer(
                self.backend.name(),
                result.is_ok(),
                elapsed_ms,
                staged.bytes,
            );

            match result {
                Ok(()) => {
                    report.transferred += 1;
                    report.bytes_transferred += staged.bytes;
                    report.transfer_ms.push(elapsed_ms);
                    info!(
                        index,
                        artifact = %staged.artifact,
                        bytes = staged.bytes,
                        elapsed_ms,
                        "Transferred"
                    );
                }
                Err(e) => {
                    report.transfer_failures += 1;
                    error!(index, artifact = %staged.artifact, error = %e, "Transfer failed");
                }
            }

            self.staging.release(&staged).await;
        }

        self.transition(UnitState::Done);
        report.state = self.state;
        info!(
            transferred = report.transferred,
            failures = report.staging_failures + report.transfer_failures,
            late = report.late,
            "Unit done"
        );
        report
    }
}

/// Drive one unit from `Starting` to a terminal state
///
/// Never fails: setup errors end in an `Aborted` report.
pub async fn run_unit<F, C>(plan: UnitPlan, factory: &F, clock: C) -> UnitReport
where
    F: BackendFactory,
    C: Clock,
{
    let unit = plan.unit.clone();
    let backend = match factory.connect(&unit).await {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "Backend setup failed, unit aborted");
            return UnitReport::aborted(unit, &e);
        }
    };

    match ExposureUnit::new(plan, backend, clock) {
        Ok(exposure_unit) => exposure_unit.run().await,
        Err(e) => {
            error!(error = %e, "Unit setup failed, unit aborted");
            UnitReport::aborted(unit, &e)
        }
    }
}
