//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（订阅请求线格式、配置解析）
//! - 模拟 e2e 测试（MockConnector，无需网络）
//! - 回环 e2e 测试（本地 WebSocket / HTTP 服务）

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bytes::Bytes;
    use contracts::{ContractError, DataSink, FieldMap, RecordKind};

    pub type Writes = Arc<Mutex<Vec<(RecordKind, FieldMap)>>>;

    /// Sink that keeps every record in memory
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub writes: Writes,
    }

    impl DataSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn write(
            &mut self,
            kind: RecordKind,
            fields: &FieldMap,
        ) -> Result<(), ContractError> {
            self.writes.lock().unwrap().push((kind, fields.clone()));
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    pub fn position_frame(mmsi: u32, latitude: &str, longitude: &str) -> Bytes {
        Bytes::from(format!(
            r#"{{"MessageType":"PositionReport","MetaData":{{"MMSI":{mmsi},"ShipName":"ELSA","time_utc":"2024-05-17 06:30:12.123 +0000 UTC"}},"Message":{{"PositionReport":{{"UserID":{mmsi},"Latitude":{latitude},"Longitude":{longitude},"Cog":45.2,"Sog":12.3,"TrueHeading":44,"NavigationalStatus":0,"Valid":true}}}}}}"#
        ))
    }

    pub fn static_frame(mmsi: u32) -> Bytes {
        Bytes::from(format!(
            r#"{{"MessageType":"ShipStaticData","MetaData":{{"MMSI":{mmsi}}},"Message":{{"ShipStaticData":{{"UserID":{mmsi},"Name":"ELSA@@@@","CallSign":"SFAB","Destination":"GOTEBORG","ImoNumber":9123456,"Type":70,"Dimension":{{"A":100,"B":20,"C":8,"D":8}},"Eta":{{"Month":5,"Day":18,"Hour":14,"Minute":0}},"MaximumStaticDraught":7.4}}}}}}"#
        ))
    }

    /// Poll `condition` until it holds or the deadline passes
    pub async fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(timeout, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not met before timeout");
    }
}

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BoundingBox, SinkType, SubscriptionRequest};
    use serde_json::json;

    #[test]
    fn test_subscription_wire_shape() {
        let request = SubscriptionRequest::new(
            "test-key",
            vec![BoundingBox::WORLD],
            vec!["266064000".to_string()],
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "APIKey": "test-key",
                "BoundingBoxes": [[[-90.0, -180.0], [90.0, 180.0]]],
                "FiltersShipMMSI": ["266064000"]
            })
        );

        let unfiltered = SubscriptionRequest::new("k", vec![BoundingBox::WORLD], Vec::new());
        let value = serde_json::to_value(&unfiltered).unwrap();
        assert!(value.get("FiltersShipMMSI").is_none());
    }

    #[test]
    fn test_full_config_parses_and_validates() {
        let content = r#"
[feed]
mode = "stream"
api_key = "abc"
filter_mmsi = ["266064000"]
bounding_boxes = [[[50.0, -5.0], [60.0, 12.0]]]

[supervisor]
backoff_secs = 30

[sink]
name = "supabase"
sink_type = "postgrest"
params = { url = "https://xyz.supabase.co", api_key = "anon" }
"#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.supervisor.backoff_secs, 30);
        assert_eq!(config.supervisor.reconnect_delay_secs, 1);
        assert_eq!(config.sink.sink_type, SinkType::Postgrest);

        let request = config.subscription_request();
        assert_eq!(request.filter_mmsi, vec!["266064000".to_string()]);
        assert!(request.matches(266064000, 57.1, 11.9));
        assert!(!request.matches(266064000, 10.0, 11.9));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use bytes::Bytes;
    use contracts::{SinkConfig, SinkType, SubscriptionRequest};
    use dispatcher::create_dispatcher;
    use ingestion::{MockConnector, MockScript, ScriptEnd};
    use serde_json::Value;
    use supervisor::{Supervisor, SupervisorConfig};
    use tokio::sync::watch;

    use crate::support::{eventually, position_frame, static_frame};

    /// MockConnector -> Supervisor -> Dispatcher -> FileSink
    ///
    /// 验证完整的数据流：
    /// 1. 首次建连失败后按退避重试
    /// 2. 位置报告与静态数据各写入一行
    /// 3. 未知类型与坏帧不影响后续帧
    #[tokio::test]
    async fn test_e2e_mock_pipeline_to_file_sink() {
        let output = tempfile::tempdir().unwrap();
        let sink_config = SinkConfig {
            name: "local".to_string(),
            sink_type: SinkType::File,
            params: HashMap::from([(
                "base_path".to_string(),
                output.path().display().to_string(),
            )]),
        };

        let connector = MockConnector::new().fail_first(1).with_session(
            MockScript::frames([
                position_frame(266064000, "57.1", "11.9"),
                Bytes::from_static(br#"{"MessageType":"AidsToNavigationReport","Message":{}}"#),
                Bytes::from_static(b"\x00\x01garbage"),
                static_frame(266064000),
            ])
            .then(ScriptEnd::Hang),
        );

        let supervisor = Supervisor::new(
            connector.clone(),
            SubscriptionRequest::new("key", Vec::new(), vec!["266064000".to_string()]),
            create_dispatcher(&sink_config).unwrap(),
            SupervisorConfig {
                backoff: Duration::from_millis(50),
                reconnect_delay: Duration::from_millis(10),
            },
        );
        let stats = supervisor.stats();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(supervisor.run(shutdown_rx));

        eventually(Duration::from_secs(5), || stats.snapshot().frames_read == 4).await;
        shutdown_tx.send(true).unwrap();
        let snapshot = handle.await.unwrap().unwrap();

        assert_eq!(snapshot.acquire_attempts, 2);
        assert_eq!(snapshot.records_written, 2);
        assert_eq!(snapshot.unknown_messages, 1);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(connector.close_counts(), vec![1]);

        let positions =
            std::fs::read_to_string(output.path().join("position_report.ndjson")).unwrap();
        let lines: Vec<&str> = positions.lines().collect();
        assert_eq!(lines.len(), 1);
        let row: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(row["userid"], 266064000);
        assert_eq!(row["latitude"].as_f64().unwrap().to_bits(), 57.1f64.to_bits());
        assert_eq!(row["longitude"].as_f64().unwrap().to_bits(), 11.9f64.to_bits());
        assert!(row["received_at"].is_string());

        let statics =
            std::fs::read_to_string(output.path().join("ship_static_data.ndjson")).unwrap();
        let row: Value = serde_json::from_str(statics.lines().next().unwrap()).unwrap();
        assert_eq!(row["name"], "ELSA");
        assert_eq!(row["eta_hour"], 14);
    }
}

#[cfg(test)]
mod stream_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bytes::Bytes;
    use contracts::{
        ConnectionManager, ContractError, FeedSession, FieldValue, IngestConfig, RecordKind,
        SubscriptionRequest,
    };
    use dispatcher::Dispatcher;
    use futures_util::{SinkExt, StreamExt};
    use ingestion::{StreamConnector, WsSession};
    use serde_json::{json, Value};
    use supervisor::{Supervisor, SupervisorConfig};
    use tokio::net::TcpListener;
    use tokio::sync::{oneshot, watch};
    use tokio_tungstenite::tungstenite::Message;

    use crate::support::{eventually, position_frame, RecordingSink};

    /// Loopback feed: accepts one client, reports its first message, sends
    /// `frames`, then waits for the client to go away.
    async fn loopback_feed(frames: Vec<bytes::Bytes>) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (first_tx, first_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            if let Some(Ok(Message::Text(text))) = ws.next().await {
                let _ = first_tx.send(text.as_str().to_string());
            }
            for frame in frames {
                let text = String::from_utf8(frame.to_vec()).unwrap();
                ws.send(Message::Text(text.into())).await.unwrap();
            }
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
        });

        (format!("ws://{addr}"), first_rx)
    }

    #[tokio::test]
    async fn test_subscription_is_first_outbound_message() {
        let (url, first_rx) = loopback_feed(Vec::new()).await;

        let mut config = IngestConfig::default();
        config.feed.url = url;
        config.feed.api_key = "test-key".to_string();
        config.feed.filter_mmsi = vec!["266064000".to_string()];
        config_loader::validate(&config).unwrap();

        let connector = StreamConnector::from_config(&config.feed).unwrap();
        let mut session = connector
            .acquire(&config.subscription_request())
            .await
            .unwrap();

        let first: Value = serde_json::from_str(&first_rx.await.unwrap()).unwrap();
        assert_eq!(
            first,
            json!({
                "APIKey": "test-key",
                "BoundingBoxes": [[[-90.0, -180.0], [90.0, 180.0]]],
                "FiltersShipMMSI": ["266064000"]
            })
        );

        session.close().await;
        session.close().await;
    }

    #[tokio::test]
    async fn test_e2e_position_report_over_websocket() {
        let frame = position_frame(266064000, "57.123456789012345", "11.987654321098765");
        let (url, _first_rx) = loopback_feed(vec![frame]).await;

        let connector = StreamConnector::new(url, Duration::from_secs(5)).unwrap();
        let sink = RecordingSink::default();
        let writes = sink.writes.clone();
        let request = SubscriptionRequest::new(
            "test-key",
            vec![contracts::BoundingBox::WORLD],
            vec!["266064000".to_string()],
        );
        let supervisor = Supervisor::new(
            connector,
            request,
            Dispatcher::new(sink),
            SupervisorConfig::default(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(supervisor.run(shutdown_rx));

        eventually(Duration::from_secs(5), || !writes.lock().unwrap().is_empty()).await;
        shutdown_tx.send(true).unwrap();
        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.sessions, 1);

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        let (kind, fields) = &writes[0];
        assert_eq!(*kind, RecordKind::PositionReport);
        assert_eq!(fields["userid"], FieldValue::Int(266064000));
        assert_eq!(
            fields["latitude"].as_f64().unwrap().to_bits(),
            57.123456789012345f64.to_bits()
        );
        assert_eq!(
            fields["longitude"].as_f64().unwrap().to_bits(),
            11.987654321098765f64.to_bits()
        );
        assert_eq!(
            fields["time_utc"].as_str(),
            Some("2024-05-17 06:30:12.123 +0000 UTC")
        );
    }

    /// Real WebSocket connector that counts `close` calls per session
    #[derive(Clone)]
    struct CountingConnector {
        inner: StreamConnector,
        closes: Arc<Mutex<Vec<Arc<AtomicUsize>>>>,
    }

    struct CountingSession {
        inner: WsSession,
        closes: Arc<AtomicUsize>,
    }

    impl ConnectionManager for CountingConnector {
        type Session = CountingSession;

        fn endpoint(&self) -> &str {
            self.inner.endpoint()
        }

        async fn acquire(
            &self,
            request: &SubscriptionRequest,
        ) -> Result<CountingSession, ContractError> {
            let inner = self.inner.acquire(request).await?;
            let closes = Arc::new(AtomicUsize::new(0));
            self.closes.lock().unwrap().push(closes.clone());
            Ok(CountingSession { inner, closes })
        }
    }

    impl FeedSession for CountingSession {
        async fn read_frame(&mut self) -> Result<Bytes, ContractError> {
            self.inner.read_frame().await
        }

        async fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.inner.close().await;
        }
    }

    #[tokio::test]
    async fn test_server_close_triggers_reacquire() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // first connection: one frame then a close frame; second: one frame and stay open
        tokio::spawn(async move {
            for (mmsi, close_after) in [(266064000u32, true), (230000000, false)] {
                let (stream, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                    let _subscription = ws.next().await;
                    let frame = position_frame(mmsi, "57.1", "11.9");
                    let text = String::from_utf8(frame.to_vec()).unwrap();
                    ws.send(Message::Text(text.into())).await.unwrap();
                    if close_after {
                        let _ = ws.close(None).await;
                    }
                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });

        let connector = CountingConnector {
            inner: StreamConnector::new(format!("ws://{addr}"), Duration::from_secs(5)).unwrap(),
            closes: Arc::default(),
        };
        let closes = connector.closes.clone();
        let sink = RecordingSink::default();
        let writes = sink.writes.clone();
        let supervisor = Supervisor::new(
            connector,
            SubscriptionRequest::new("test-key", Vec::new(), Vec::new()),
            Dispatcher::new(sink),
            SupervisorConfig {
                backoff: Duration::from_secs(60),
                reconnect_delay: Duration::from_millis(50),
            },
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(supervisor.run(shutdown_rx));

        eventually(Duration::from_secs(5), || writes.lock().unwrap().len() == 2).await;
        shutdown_tx.send(true).unwrap();
        let snapshot = handle.await.unwrap().unwrap();

        assert_eq!(snapshot.sessions, 2);
        assert_eq!(snapshot.acquire_failures, 0);
        let counts: Vec<usize> = closes
            .lock()
            .unwrap()
            .iter()
            .map(|count| count.load(Ordering::SeqCst))
            .collect();
        assert_eq!(counts, vec![1, 1]);

        let users: Vec<FieldValue> = writes
            .lock()
            .unwrap()
            .iter()
            .map(|(_, fields)| fields["userid"].clone())
            .collect();
        assert_eq!(
            users,
            vec![FieldValue::Int(266064000), FieldValue::Int(230000000)]
        );
    }
}

#[cfg(test)]
mod polling_tests {
    use std::time::Duration;

    use axum::routing::get;
    use axum::{Json, Router};
    use contracts::{
        ConnectionManager, ContractError, FeedSession, Payload, RecordKind, SubscriptionRequest,
    };
    use dispatcher::Dispatcher;
    use ingestion::{decode, PollingConnector};
    use serde_json::{json, Value};
    use supervisor::{Supervisor, SupervisorConfig};
    use tokio::sync::watch;

    use crate::support::{eventually, RecordingSink};

    fn vessel_list() -> Value {
        json!([
            {"AIS": {"MMSI": 266064000, "TIMESTAMP": "2024-05-17 06:30:00 UTC",
                     "LATITUDE": 57.1, "LONGITUDE": 11.9, "COURSE": 45.0, "SPEED": 12.3,
                     "HEADING": 44, "NAVSTAT": 0, "NAME": "ELSA", "TYPE": 70}},
            {"AIS": {"MMSI": 230000000, "LATITUDE": 60.1, "LONGITUDE": 24.9}}
        ])
    }

    /// Serve `body` at `/vessels` and return a connector pointed at it
    async fn serve_vessels(body: Value) -> PollingConnector {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/vessels",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        PollingConnector::new(
            format!("http://{addr}/vessels"),
            Duration::from_secs(600),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_position_less_record_does_not_fail_acquire() {
        let connector = serve_vessels(json!([
            {"AIS": {"MMSI": 266064000, "LATITUDE": 57.1, "LONGITUDE": 11.9,
                     "ETA": "2024-05-18 14:00:00", "ETA_PREDICTED": "2024-05-18 13:40:00",
                     "DISTANCE_REMAINING": 42.5, "LOCODE": "SEGOT"}},
            {"AIS": {"MMSI": 230000000, "LATITUDE": null, "LONGITUDE": null}}
        ]))
        .await;
        let request = SubscriptionRequest::new("", Vec::new(), Vec::new());

        let mut session = connector.acquire(&request).await.unwrap();
        let position = decode(&session.read_frame().await.unwrap()).unwrap();
        let static_data = decode(&session.read_frame().await.unwrap()).unwrap();
        session.close().await;

        let Payload::PositionReport(report) = position.payload else {
            panic!("expected position report");
        };
        assert_eq!(report.user_id, 266064000);
        let Payload::ShipStaticData(data) = static_data.payload else {
            panic!("expected ship static data");
        };
        assert_eq!(data.eta_predicted.as_deref(), Some("2024-05-18 13:40:00"));
        assert_eq!(data.distance_remaining, Some(42.5));
    }

    #[tokio::test]
    async fn test_non_list_body_is_handshake_failure() {
        let connector = serve_vessels(json!({"error": "invalid userkey"})).await;
        let request = SubscriptionRequest::new("", Vec::new(), Vec::new());

        let err = connector.acquire(&request).await.err().unwrap();
        assert!(matches!(err, ContractError::HandshakeFailed { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_e2e_polled_vessel_list() {
        let connector = serve_vessels(vessel_list()).await;
        let sink = RecordingSink::default();
        let writes = sink.writes.clone();
        let supervisor = Supervisor::new(
            connector,
            SubscriptionRequest::new("", Vec::new(), vec!["266064000".to_string()]),
            Dispatcher::new(sink),
            SupervisorConfig::default(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(supervisor.run(shutdown_rx));

        eventually(Duration::from_secs(5), || writes.lock().unwrap().len() == 2).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        let writes = writes.lock().unwrap();
        let kinds: Vec<RecordKind> = writes.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, vec![RecordKind::PositionReport, RecordKind::ShipStaticData]);
        assert_eq!(writes[1].1["name"].as_str(), Some("ELSA"));
    }
}
