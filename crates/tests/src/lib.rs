//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Configuration defaults shared by every crate
//! - Scripted device -> parser -> queue -> sink, through the controller
//! - Capture replay into a file sink
//! - Device open failures surfacing from `start`

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BackpressurePolicy, ConfigVersion};

    #[test]
    fn test_minimal_config_defaults() {
        let config = ConfigLoader::load_from_str(
            "[device]\nport = \"COM4\"\n[sink]\nname = \"log\"\nsink_type = \"log\"\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(config.version, ConfigVersion::V1);
        assert_eq!(config.device.baud_rate, 9600);
        assert_eq!(config.device.read_timeout_ms, 1000);
        assert_eq!(config.device.read_buffer_size, 1024);
        assert_eq!(config.queue.capacity, 64);
        assert_eq!(config.queue.policy, BackpressurePolicy::Block);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::{Duration, Instant};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::IngestConfig;
    use ingestion::{ReplayConfig, ReplayConnector, ScriptedConnector, SerialConnector};
    use lifecycle::{ControllerState, LifecycleController, LifecycleError, ReaderExit};
    use persistence::{create_sink, MemorySink};

    fn config(sink_toml: &str) -> IngestConfig {
        let toml = format!(
            "[device]\nport = \"/dev/ttyACM0\"\nbaud_rate = 9600\nread_timeout_ms = 10\n\n\
             [queue]\ncapacity = 8\n\n{sink_toml}"
        );
        ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap()
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Scripted firmware output -> controller -> memory sink
    ///
    /// Checks parse order, rejection accounting and device release.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_scripted_device() {
        let config = config("[sink]\nname = \"memory\"\nsink_type = \"log\"\n");
        let connector = ScriptedConnector::from_lines(&[
            "23.51 Celsius, ",
            "\r\n",
            "Celsius",
            "23.49 Celsius, ",
            "23.5.1",
            "23.62 Celsius, ",
        ])
        .with_chunk_interval(Duration::from_millis(2));
        let probe = connector.probe();
        let observer = MemorySink::new("memory");

        let mut controller = LifecycleController::from_config(&config, connector, observer.clone());
        controller.start().await.unwrap();
        wait_until(|| observer.saved().len() == 3).await;
        let stats = controller.stop().await.unwrap().unwrap();

        assert_eq!(observer.values(), vec![23.51, 23.49, 23.62]);
        let sequences: Vec<u64> = observer.saved().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 3, 5]);

        assert_eq!(stats.chunks_received, 6);
        assert_eq!(stats.empty_frames, 1);
        assert_eq!(stats.malformed_frames, 1);
        assert_eq!(stats.invalid_frames, 1);
        assert_eq!(stats.saves_succeeded, 3);
        assert_eq!(stats.reader_exit, Some(ReaderExit::Stopped));
        assert!((stats.temperature.temperature.max - 23.62).abs() < 1e-9);

        assert_eq!(controller.state(), ControllerState::Closed);
        assert!(!probe.is_open());
    }

    /// Configured file sink receives one JSON line per reading, in order
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_file_sink_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");
        let config = config(&format!(
            "[sink]\nname = \"file\"\nsink_type = \"file\"\n[sink.params]\npath = {:?}\n",
            path.display().to_string()
        ));

        let lines: Vec<String> = (0..25).map(|i| format!("{}.25C\n", 15 + i)).collect();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let sink = create_sink(&config.sink).unwrap();
        let mut controller =
            LifecycleController::from_config(&config, ScriptedConnector::from_lines(&lines), sink);

        controller.start().await.unwrap();
        wait_until(|| {
            controller
                .sink_metrics()
                .is_some_and(|m| m.save_count == 25)
        })
        .await;
        controller.stop().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let values: Vec<f64> = content
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["value"].as_f64().unwrap())
            .collect();
        let expected: Vec<f64> = (0..25).map(|i| (15 + i) as f64 + 0.25).collect();
        assert_eq!(values, expected);
    }

    /// Capture replay ends with a disconnect; the controller keeps running
    /// until stopped
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_replay_capture() {
        let report = "21.75 Celsius, ";
        let mut capture = tempfile::NamedTempFile::new().unwrap();
        for _ in 0..4 {
            capture.write_all(report.as_bytes()).unwrap();
        }

        let config = config("[sink]\nname = \"memory\"\nsink_type = \"log\"\n");
        let connector = ReplayConnector::new(ReplayConfig {
            path: capture.path().to_path_buf(),
            chunk_size: report.len(),
            interval: Duration::ZERO,
            loop_playback: false,
        });
        let observer = MemorySink::new("memory");
        let mut controller = LifecycleController::from_config(&config, connector, observer.clone());

        controller.start().await.unwrap();
        wait_until(|| !controller.is_acquiring()).await;
        assert_eq!(controller.state(), ControllerState::Running);

        let stats = controller.stop().await.unwrap().unwrap();
        assert_eq!(stats.reader_exit, Some(ReaderExit::Disconnected));
        assert_eq!(observer.values(), vec![21.75; 4]);
    }

    /// A missing serial port fails `start` and leaves the controller Closed
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_missing_serial_port() {
        let mut config = config("[sink]\nname = \"memory\"\nsink_type = \"log\"\n");
        config.device.port = "/dev/thermo-ingest-missing".to_string();

        let mut controller =
            LifecycleController::from_config(&config, SerialConnector::new(), MemorySink::new("m"));
        let err = controller.start().await.unwrap_err();

        assert!(matches!(err, LifecycleError::DeviceOpen(_)));
        assert_eq!(controller.state(), ControllerState::Closed);
        assert!(controller.stop().await.unwrap().is_none());
    }
}
