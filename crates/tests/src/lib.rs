//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> 单元计划 -> 并发扇出 -> 真实后端 的完整链路
//! - HTTP PUT 与本地对象存储目的地
//! - 慢速单元不阻塞其他单元

#[cfg(test)]
mod contract_tests {
    use contracts::{ArtifactPath, CameraTag, ObsDay};

    #[test]
    fn test_artifact_naming_contract() {
        let day = ObsDay::new(chrono::NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        let path = ArtifactPath::new(day, 22051, CameraTag::Cc, "R22_S11");
        assert_eq!(
            path.as_str(),
            "2024-03-07/2024030722051/CC_O_20240307_22051-R22_S11.fits"
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use axum::body::Bytes;
    use axum::extract::{Path as UriPath, State};
    use axum::http::StatusCode;
    use axum::routing::put;
    use axum::Router;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use contracts::{
        ArtifactPath, ContractError, SimulationConfig, StartTime, TransportBackend, UnitId,
    };
    use exposure::{FixedClock, OffsetClock};
    use runner::{BackendFactory, FanOut, UnitPlan, UnitState, UriBackendFactory};

    /// (path, body, arrival)
    type Received = Arc<Mutex<Vec<(String, Vec<u8>, Instant)>>>;

    async fn record(
        State(received): State<Received>,
        UriPath(path): UriPath<String>,
        body: Bytes,
    ) -> StatusCode {
        received
            .lock()
            .unwrap()
            .push((path, body.to_vec(), Instant::now()));
        StatusCode::CREATED
    }

    async fn serve() -> (String, Received) {
        let received = Received::default();
        let app = Router::new()
            .route("/{*path}", put(record))
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/upload"), received)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        day().and_hms_opt(hour, minute, second).unwrap()
    }

    /// Config with an image written under `dir`
    fn config(dir: &Path, destination: &str, exposures: u32) -> SimulationConfig {
        let input = dir.join("S00.fits");
        std::fs::write(&input, b"SIMPLE  =                    T").unwrap();

        let mut config =
            SimulationConfig::new(destination, StartTime::new(10, 0).unwrap(), exposures);
        config.input = input;
        config.temp_dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_e2e_http_put_late_start() {
        let dir = tempfile::tempdir().unwrap();
        let (base, received) = serve().await;
        let config = config(dir.path(), &base, 3);
        config_loader::ConfigLoader::validate(&config).unwrap();

        let plans = UnitPlan::from_config(&config).unwrap();
        let factory = UriBackendFactory::new(config.destination.clone(), config.transport.clone());

        // noon: every exposure of a 10:00 schedule is already late
        let report = FanOut::with_clock(plans, factory, FixedClock::new(at(12, 0, 0)))
            .unwrap()
            .run()
            .await;

        assert_eq!(report.joined(), 1);
        assert_eq!(report.transferred(), 3);
        assert_eq!(report.units[0].state, UnitState::Done);
        assert_eq!(report.units[0].late, 3);

        let received = received.lock().unwrap();
        let paths: Vec<&str> = received.iter().map(|(p, _, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "upload/2024-03-07/2024030710000/MC_O_20240307_10000-0-0.fits",
                "upload/2024-03-07/2024030710001/MC_O_20240307_10001-0-0.fits",
                "upload/2024-03-07/2024030710002/MC_O_20240307_10002-0-0.fits",
            ]
        );
        assert!(received.iter().all(|(_, body, _)| body.starts_with(b"SIMPLE")));
    }

    #[tokio::test]
    async fn test_e2e_four_units_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let (base, received) = serve().await;
        let mut config = config(dir.path(), &base, 2);
        config.sensors.node = 9;
        config.sensors.count = 4;

        let plans = UnitPlan::from_config(&config).unwrap();
        let factory = UriBackendFactory::new(config.destination.clone(), config.transport.clone());
        let report = FanOut::with_clock(plans, factory, FixedClock::new(at(12, 0, 0)))
            .unwrap()
            .run()
            .await;

        assert_eq!(report.transferred(), 8);
        let mut firsts: Vec<u64> = report
            .units
            .iter()
            .map(|u| u.first_sequence.unwrap())
            .collect();
        firsts.sort_unstable();
        assert_eq!(firsts, vec![10000, 10001, 10002, 10003]);

        let mut paths: Vec<String> = received
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _, _)| p.clone())
            .collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
        assert!(paths.iter().any(|p| p.ends_with("MC_O_20240307_10003-9-3.fits")));
    }

    #[tokio::test]
    async fn test_e2e_local_store_with_compression() {
        let dir = tempfile::tempdir().unwrap();
        let store_root = tempfile::tempdir().unwrap();
        let destination = format!("file://{}", store_root.path().display());
        let mut config = config(dir.path(), &destination, 2);
        config.compress = true;

        let plans = UnitPlan::from_config(&config).unwrap();
        let factory = UriBackendFactory::new(config.destination.clone(), config.transport.clone());
        let report = FanOut::with_clock(plans, factory, FixedClock::new(at(12, 0, 0)))
            .unwrap()
            .run()
            .await;
        assert_eq!(report.transferred(), 2);

        let object = store_root
            .path()
            .join("2024-03-07/2024030710001/MC_O_20240307_10001-0-0.fits.gz");
        let compressed = std::fs::read(&object).unwrap();

        use std::io::Read;
        let mut decoded = Vec::new();
        flate2::read::GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert!(decoded.starts_with(b"SIMPLE"));

        // no staging directories left behind
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("camxfer-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_e2e_missing_input_aborts_only_that_run() {
        let dir = tempfile::tempdir().unwrap();
        let (base, received) = serve().await;
        let mut config = config(dir.path(), &base, 2);
        config.input = dir.path().join("nope");

        let plans = UnitPlan::from_config(&config).unwrap();
        let factory = UriBackendFactory::new(config.destination.clone(), config.transport.clone());
        let report = FanOut::with_clock(plans, factory, FixedClock::new(at(12, 0, 0)))
            .unwrap()
            .run()
            .await;

        assert_eq!(report.aborted(), 1);
        assert!(report.units[0].error.is_some());
        assert!(received.lock().unwrap().is_empty());
    }

    /// Real backend whose transfers for one sensor are delayed
    struct DelayedBackend {
        inner: transport::Backend,
        delay: Option<Duration>,
    }

    impl TransportBackend for DelayedBackend {
        fn name(&self) -> &str {
            "delayed"
        }

        async fn transfer(
            &mut self,
            local_file: &Path,
            remote: &ArtifactPath,
        ) -> Result<(), ContractError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            contracts::TransportBackend::transfer(&mut self.inner, local_file, remote).await
        }
    }

    struct DelayedFactory {
        inner: UriBackendFactory,
        slow_sensor: String,
        delay: Duration,
    }

    impl BackendFactory for DelayedFactory {
        type Backend = DelayedBackend;

        async fn connect(&self, unit: &UnitId) -> Result<DelayedBackend, ContractError> {
            let inner = BackendFactory::connect(&self.inner, unit).await?;
            let delay = (unit.sensor.as_str() == self.slow_sensor).then_some(self.delay);
            Ok(DelayedBackend { inner, delay })
        }
    }

    #[tokio::test]
    async fn test_e2e_slow_unit_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let (base, received) = serve().await;
        let mut config = config(dir.path(), &base, 3);
        config.sensors.count = 2;

        // 50 ms cadence so every exposure is waited for rather than late
        let schedule = contracts::ScheduleSpec::with_interval(
            StartTime::new(10, 0).unwrap(),
            Duration::from_millis(50),
        )
        .unwrap();
        let plans: Vec<UnitPlan> = UnitPlan::from_config(&config)
            .unwrap()
            .into_iter()
            .map(|plan| UnitPlan { schedule, ..plan })
            .collect();

        let factory = DelayedFactory {
            inner: UriBackendFactory::new(config.destination.clone(), config.transport.clone()),
            slow_sensor: "0-0".to_string(),
            delay: Duration::from_millis(500),
        };
        let clock = OffsetClock::starting_at(at(9, 59, 59) + TimeDelta::milliseconds(950));

        let started = Instant::now();
        let report = FanOut::with_clock(plans, factory, clock)
            .unwrap()
            .run()
            .await;
        assert_eq!(report.transferred(), 6);

        let received = received.lock().unwrap();
        let fast_last = received
            .iter()
            .filter(|(p, _, _)| p.ends_with("-0-1.fits"))
            .map(|(_, _, t)| *t)
            .max()
            .unwrap();
        let slow_first = received
            .iter()
            .filter(|(p, _, _)| p.ends_with("-0-0.fits"))
            .map(|(_, _, t)| *t)
            .min()
            .unwrap();

        assert!(fast_last < slow_first);
        assert!(fast_last.duration_since(started) < Duration::from_millis(500));
    }
}
