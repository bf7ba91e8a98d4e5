//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 / 请求体契约测试
//! - 模拟终端 e2e 测试（MockConnector + 真实 HttpSender）
//! - TCP 考勤协议 e2e 测试（终端模拟器 + ZkConnector）

#[cfg(test)]
mod support;

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DeliveryMode, DirectorySource, WatermarkPolicy};
    use forwarder::PunchBatch;

    use crate::support::punch;

    const EXAMPLE_CONFIG: &str = r#"
[scheduler]
poll_interval_secs = 5
max_concurrent_branches = 4
cycle_timeout_secs = 30

[device]
port = 4370
connect_timeout_ms = 5000
reply_timeout_ms = 5200

[ingestion]
url = "https://api.example.com/punches"
timeout_ms = 10000
dry_run = false

[delivery]
watermark_policy = "max_timestamp"
mode = "at_least_once"

[directory]
source = "static"
branches = [{ id = "B1", address = "10.0.0.10" }]
"#;

    #[test]
    fn test_example_config_loads() {
        let config = ConfigLoader::load_from_str(EXAMPLE_CONFIG, ConfigFormat::Toml).unwrap();

        assert_eq!(config.scheduler.poll_interval_secs, 5);
        assert_eq!(config.device.port, 4370);
        assert_eq!(config.delivery.mode, DeliveryMode::AtLeastOnce);
        assert_eq!(config.delivery.watermark_policy, WatermarkPolicy::MaxTimestamp);
        assert_eq!(config.directory.source, DirectorySource::Static);
        assert_eq!(config.directory.branches[0].address, "10.0.0.10");
    }

    #[test]
    fn test_config_survives_toml_round_trip() {
        let config = ConfigLoader::load_from_str(EXAMPLE_CONFIG, ConfigFormat::Toml).unwrap();
        let toml = ConfigLoader::to_toml(&config).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded.ingestion.url, config.ingestion.url);
        assert_eq!(reloaded.directory.branches, config.directory.branches);
    }

    #[test]
    fn test_ingestion_body_shape() {
        let punches = vec![punch("42", 0).with_ip("10.0.0.10")];
        let body = serde_json::to_value(PunchBatch {
            punches: &punches,
            tenant_id: "B1",
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "punches": [{
                    "userSn": 0,
                    "deviceUserId": "42",
                    "recordTime": "2024-05-01T08:00:00",
                    "verifyType": 0,
                    "punchState": 0,
                    "ip": "10.0.0.10"
                }],
                "tenantId": "B1"
            })
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;

    use contracts::{Branch, DeliveryMode};
    use device::MockConnector;
    use directory::{FileDirectory, StaticDirectory};
    use poller::CycleError;

    use crate::support::{build_gateway, punch, record_times, ts, IngestServer};

    fn b1() -> StaticDirectory {
        StaticDirectory::new(vec![Branch::new("B1", "10.0.0.1")])
    }

    /// 首轮全量转发，之后只转发 watermark 之后的新记录
    #[tokio::test]
    async fn test_b1_forwards_only_new_punches() {
        let ingest = IngestServer::start().await;
        let connector = MockConnector::new();
        let device = connector.register("10.0.0.1");
        device.push_records([punch("1", 100), punch("2", 200)]);
        let mut gateway = build_gateway(b1(), connector, &ingest.url, DeliveryMode::AtLeastOnce);

        // Pass 1: first run floods everything
        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.records_forwarded(), 2);
        let batches = ingest.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0]["tenantId"], "B1");
        assert_eq!(
            record_times(&batches[0]),
            ["2024-05-01T08:01:40", "2024-05-01T08:03:20"]
        );
        assert_eq!(gateway.watermarks().get("B1"), Some(ts(200)));

        // Pass 2: nothing new, nothing sent
        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.records_forwarded(), 0);
        assert_eq!(ingest.batches().len(), 1);

        // Pass 3: only the new punch goes out
        device.push_records([punch("3", 300)]);
        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.records_forwarded(), 1);
        let batches = ingest.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(record_times(&batches[1]), ["2024-05-01T08:05:00"]);
        assert_eq!(gateway.watermarks().get("B1"), Some(ts(300)));
        assert_eq!(device.disconnect_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_send_redelivered_at_least_once() {
        let ingest = IngestServer::start().await;
        ingest.fail_next(1);
        let connector = MockConnector::new();
        connector
            .register("10.0.0.1")
            .push_records([punch("1", 100), punch("2", 200)]);
        let mut gateway = build_gateway(b1(), connector, &ingest.url, DeliveryMode::AtLeastOnce);

        let report = gateway.run_once().await.unwrap();
        assert!(matches!(
            report.outcome("B1").map(|o| &o.result),
            Some(Err(CycleError::Send {
                records: 2,
                watermark_advanced: false,
                ..
            }))
        ));
        assert_eq!(gateway.watermarks().get("B1"), None);

        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.records_forwarded(), 2);
        let batches = ingest.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(record_times(&batches[0]).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_lost_at_most_once() {
        let ingest = IngestServer::start().await;
        ingest.fail_next(1);
        let connector = MockConnector::new();
        let device = connector.register("10.0.0.1");
        device.push_records([punch("1", 100), punch("2", 200)]);
        let mut gateway = build_gateway(b1(), connector, &ingest.url, DeliveryMode::AtMostOnce);

        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(gateway.watermarks().get("B1"), Some(ts(200)));

        // The failed batch is gone for good
        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.records_forwarded(), 0);
        assert!(ingest.batches().is_empty());

        device.push_records([punch("3", 300)]);
        gateway.run_once().await.unwrap();
        let batches = ingest.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(record_times(&batches[0]), ["2024-05-01T08:05:00"]);
    }

    #[tokio::test]
    async fn test_branch_failures_are_isolated() {
        let ingest = IngestServer::start().await;
        let connector = MockConnector::new();
        connector.register("10.0.0.1").push_records([punch("1", 100)]);
        let flaky = connector.register("10.0.0.3");
        flaky.push_records([punch("9", 100)]);
        flaky.set_fail_fetch(true);
        let directory = StaticDirectory::new(vec![
            Branch::new("B1", "10.0.0.1"),
            Branch::new("B2", "10.0.0.2"),
            Branch::new("B3", "10.0.0.3"),
        ]);
        let mut gateway = build_gateway(
            directory,
            connector,
            &ingest.url,
            DeliveryMode::AtLeastOnce,
        );

        let report = gateway.run_once().await.unwrap();

        assert_eq!(report.succeeded(), 1);
        assert!(matches!(
            report.outcome("B2").map(|o| &o.result),
            Some(Err(CycleError::Connect { .. }))
        ));
        assert!(matches!(
            report.outcome("B3").map(|o| &o.result),
            Some(Err(CycleError::Retrieve { .. }))
        ));
        assert_eq!(flaky.disconnect_count(), 1);

        let batches = ingest.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0]["tenantId"], "B1");

        // B3 recovers on a later pass
        flaky.set_fail_fetch(false);
        let report = gateway.run_once().await.unwrap();
        assert!(report.outcome("B3").is_some_and(|o| o.forwarded() == 1));
    }

    #[tokio::test]
    async fn test_file_directory_reread_every_pass() {
        let ingest = IngestServer::start().await;
        let connector = MockConnector::new();
        connector.register("10.0.0.1").push_records([punch("1", 100)]);
        connector.register("10.0.0.2").push_records([punch("2", 100)]);

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"branches = [{{ id = "B1", address = "10.0.0.1" }}]"#).unwrap();
        let directory = FileDirectory::new(file.path());
        let mut gateway = build_gateway(
            directory,
            connector,
            &ingest.url,
            DeliveryMode::AtLeastOnce,
        );

        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.outcomes.len(), 1);

        std::fs::write(
            file.path(),
            r#"branches = [{ id = "B1", address = "10.0.0.1" }, { id = "B2", ip = "10.0.0.2" }]"#,
        )
        .unwrap();

        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcome("B2").is_some_and(|o| o.forwarded() == 1));
        assert_eq!(ingest.batches().len(), 2);
    }
}

#[cfg(test)]
mod terminal_tests {
    use contracts::{Branch, DeliveryMode, DeviceSettings};
    use device::ZkConnector;
    use directory::StaticDirectory;
    use poller::CycleError;

    use crate::support::{build_gateway, punch, record_times, ts, FakeTerminal, IngestServer};

    fn connector(port: u16) -> ZkConnector {
        ZkConnector::new(DeviceSettings {
            port,
            connect_timeout_ms: 1_000,
            reply_timeout_ms: 1_000,
        })
    }

    /// 终端模拟器 → ZkClient → FetchCycle → HttpSender → ingestion API
    #[tokio::test]
    async fn test_terminal_to_ingestion() {
        let ingest = IngestServer::start().await;
        let terminal = FakeTerminal::start(vec![punch("1001", 100), punch("1002", 200)]).await;
        let directory = StaticDirectory::new(vec![Branch::new("B1", "127.0.0.1")]);
        let mut gateway = build_gateway(
            directory,
            connector(terminal.port),
            &ingest.url,
            DeliveryMode::AtLeastOnce,
        );

        let report = gateway.run_once().await.unwrap();
        assert_eq!(report.records_forwarded(), 2, "{:?}", report.outcomes);

        let batches = ingest.batches();
        assert_eq!(batches.len(), 1);
        let first = &batches[0]["punches"][0];
        assert_eq!(first["deviceUserId"], "1001");
        assert_eq!(first["recordTime"], "2024-05-01T08:01:40");
        assert_eq!(first["ip"], "127.0.0.1");
        assert_eq!(batches[0]["tenantId"], "B1");

        gateway.run_once().await.unwrap();
        assert_eq!(ingest.batches().len(), 1);

        terminal.push([punch("1001", 300)]);
        gateway.run_once().await.unwrap();
        let batches = ingest.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(record_times(&batches[1]), ["2024-05-01T08:05:00"]);
        assert_eq!(gateway.watermarks().get("B1"), Some(ts(300)));

        // Every cycle ends its session with EXIT
        assert_eq!(terminal.exits(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_terminal_reported_as_connect_failure() {
        let ingest = IngestServer::start().await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let directory = StaticDirectory::new(vec![Branch::new("B9", "127.0.0.1")]);
        let mut gateway = build_gateway(
            directory,
            connector(port),
            &ingest.url,
            DeliveryMode::AtLeastOnce,
        );

        let report = gateway.run_once().await.unwrap();
        assert!(matches!(
            report.outcome("B9").map(|o| &o.result),
            Some(Err(CycleError::Connect { .. }))
        ));
        assert!(ingest.batches().is_empty());
        assert_eq!(gateway.watermarks().get("B9"), None);
    }
}
