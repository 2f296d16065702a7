//! Mock backends for unit and fan-out tests

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use contracts::{
    ArtifactPath, CameraTag, ContractError, ScheduleSpec, StartTime, TransportBackend, UnitId,
};

use crate::factory::BackendFactory;
use crate::unit::UnitPlan;

/// One recorded transfer attempt
#[derive(Debug, Clone)]
pub struct Delivery {
    pub unit: String,
    pub artifact: ArtifactPath,
    pub at: Instant,
}

pub type DeliveryLog = Arc<Mutex<Vec<Delivery>>>;

/// Records every transfer; optionally slow or failing
#[derive(Default)]
pub struct MockBackend {
    unit: String,
    log: DeliveryLog,
    fail_every: Option<u32>,
    delay: Option<Duration>,
    attempts: u32,
}

impl MockBackend {
    /// Every `n`-th attempt fails
    pub fn failing_every(n: u32) -> Self {
        Self {
            fail_every: Some(n),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> DeliveryLog {
        Arc::clone(&self.log)
    }
}

impl TransportBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transfer(
        &mut self,
        local_file: &Path,
        remote: &ArtifactPath,
    ) -> Result<(), ContractError> {
        assert!(local_file.exists(), "staged file must exist during transfer");
        self.attempts += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.log.lock().unwrap().push(Delivery {
            unit: self.unit.clone(),
            artifact: remote.clone(),
            at: Instant::now(),
        });

        match self.fail_every {
            Some(n) if self.attempts % n == 0 => Err(ContractError::transfer(
                "mock",
                remote.as_str(),
                "injected failure",
            )),
            _ => Ok(()),
        }
    }
}

/// Hands out [`MockBackend`]s sharing one delivery log
#[derive(Default, Clone)]
pub struct MockFactory {
    pub log: DeliveryLog,
    refuse: bool,
    slow: Option<(String, Duration)>,
    panic_for: Option<String>,
}

impl MockFactory {
    /// Every connect fails with a configuration error
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Transfers of `unit` take `delay`
    pub fn slow_for(unit: &str, delay: Duration) -> Self {
        Self {
            slow: Some((unit.to_string(), delay)),
            ..Self::default()
        }
    }

    /// Connecting `unit` panics
    pub fn panicking_for(unit: &str) -> Self {
        Self {
            panic_for: Some(unit.to_string()),
            ..Self::default()
        }
    }
}

impl BackendFactory for MockFactory {
    type Backend = MockBackend;

    async fn connect(&self, unit: &UnitId) -> Result<MockBackend, ContractError> {
        if self.refuse {
            return Err(ContractError::backend_init("mock", "refused"));
        }
        if self.panic_for.as_deref() == Some(unit.sensor.as_str()) {
            panic!("mock backend exploded for {unit}");
        }
        let delay = self
            .slow
            .as_ref()
            .filter(|(slow, _)| slow == unit.sensor.as_str())
            .map(|(_, delay)| *delay);
        Ok(MockBackend {
            unit: unit.sensor.to_string(),
            log: Arc::clone(&self.log),
            delay,
            ..MockBackend::default()
        })
    }
}

/// Plan starting at 10:00 with a 17 s cadence
pub fn plan_for(
    unit: UnitId,
    unit_count: u32,
    num_exposures: u32,
    input: &Path,
    temp_root: &Path,
) -> UnitPlan {
    UnitPlan {
        unit,
        unit_count,
        schedule: ScheduleSpec::new(StartTime::new(10, 0).unwrap(), 17).unwrap(),
        num_exposures,
        camera: CameraTag::Mc,
        input: input.to_path_buf(),
        temp_root: temp_root.to_path_buf(),
        compress: false,
    }
}
