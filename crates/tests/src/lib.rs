//! # Integration Tests
//!
//! End-to-end tests for the delivery relay.
//!
//! Covers:
//! - Mock source -> engine -> strategy data flow
//! - The batch-posting wire contract against a local acknowledgement server
//! - Buffer retention across delivery failures and engine restarts
//! - Credential redaction in request logging

#[cfg(test)]
mod support {
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP server answering every request with `body`.
    ///
    /// Counts accepted connections so tests can assert that no network call
    /// was made at all.
    pub async fn ack_server(body: &'static str, connections: Arc<AtomicU64>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                connections.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

                read_request(&mut stream).await;

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        addr
    }

    /// Read one HTTP request: headers, then the announced body length.
    async fn read_request(stream: &mut tokio::net::TcpStream) {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let Ok(n) = stream.read(&mut buf).await else {
                return;
            };
            if n == 0 {
                return;
            }
            data.extend_from_slice(&buf[..n]);

            let Some(header_end) = find_header_end(&data) else {
                continue;
            };
            let headers = String::from_utf8_lossy(&data[..header_end]);
            let content_length: usize = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse().ok())?
                })
                .unwrap_or(0);

            if data.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }

    fn find_header_end(data: &[u8]) -> Option<usize> {
        data.windows(4).position(|w| w == b"\r\n\r\n")
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{BufferOptions, DestinationConfig, Record, StrategyType};
    use dispatcher::{create_engine, EngineMetrics};
    use ingestion::MockReadingSource;
    use tokio::time::sleep;

    fn log_destination(name: &str) -> DestinationConfig {
        DestinationConfig {
            name: name.into(),
            strategy: StrategyType::Log,
            buffer: BufferOptions::default(),
            queue_capacity: 100,
            settings: HashMap::from([("max_items_per_post".to_string(), "50".to_string())]),
        }
    }

    /// Wait until the delivered count reaches `target`, or panic.
    async fn wait_for_delivery(metrics: &Arc<EngineMetrics>, target: u64) {
        for _ in 0..50 {
            if metrics.delivered_count() >= target {
                return;
            }
            sleep(Duration::from_millis(100)).await;
        }
        panic!(
            "expected {} delivered records, got {}",
            target,
            metrics.delivered_count()
        );
    }

    /// End-to-end: MockReadingSource -> fan-out -> engine -> LogStrategy
    #[tokio::test]
    async fn test_e2e_mock_relay() {
        let source = MockReadingSource::node(10, 100.0, vec![21.0, 230.0]);
        let mut records = source.start(100);

        let handle = create_engine(&log_destination("debug")).unwrap();
        let metrics = Arc::clone(handle.metrics());

        let target = 20u64;
        for _ in 0..target {
            let record = records.recv().await.unwrap();
            handle.try_send(record);
        }
        source.stop();

        wait_for_delivery(&metrics, target).await;

        handle.shutdown().await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.buffered_count, target);
        assert_eq!(snapshot.delivered_count, target);
        assert_eq!(snapshot.buffer_depth, 0);
    }

    /// Two engines for the same stream deliver independently and share nothing
    #[tokio::test]
    async fn test_fanout_engines_are_independent() {
        let first = create_engine(&log_destination("first")).unwrap();
        let second = create_engine(&log_destination("second")).unwrap();
        let first_metrics = Arc::clone(first.metrics());
        let second_metrics = Arc::clone(second.metrics());

        for t in 0..5u64 {
            let record = Record::new(t, 7, vec![1.5]);
            first.try_send(record.clone());
            second.try_send(record);
        }

        wait_for_delivery(&first_metrics, 5).await;
        wait_for_delivery(&second_metrics, 5).await;

        first.shutdown().await;
        second.shutdown().await;
    }

    /// A file-buffered destination retains undelivered records across an
    /// engine restart.
    #[tokio::test]
    async fn test_file_buffer_survives_engine_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.jsonl");

        // First engine: bulk strategy with no apikey, so every flush is
        // skipped and records stay pending.
        let stuck = DestinationConfig {
            name: "stuck".into(),
            strategy: StrategyType::BulkJson,
            buffer: BufferOptions {
                backend: contracts::BufferBackend::File,
                capacity: 100,
                path: Some(path.clone()),
            },
            queue_capacity: 100,
            settings: HashMap::new(),
        };
        let handle = create_engine(&stuck).unwrap();
        let metrics = Arc::clone(handle.metrics());

        for t in 0..3u64 {
            handle.try_send(Record::new(t, 5, vec![21.0]));
        }

        // Let the loop drain the queue into the buffer.
        for _ in 0..50 {
            if metrics.buffered_count() >= 3 {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }
        handle.shutdown().await;
        assert_eq!(metrics.snapshot().buffer_depth, 3);

        // Second engine on the same snapshot delivers the backlog.
        let recovered = DestinationConfig {
            name: "recovered".into(),
            strategy: StrategyType::Log,
            buffer: BufferOptions {
                backend: contracts::BufferBackend::File,
                capacity: 100,
                path: Some(path),
            },
            queue_capacity: 100,
            settings: HashMap::new(),
        };
        let handle = create_engine(&recovered).unwrap();
        let metrics = Arc::clone(handle.metrics());

        wait_for_delivery(&metrics, 3).await;
        handle.shutdown().await;
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::Record;
    use dispatcher::create_engine;
    use tokio::time::sleep;

    /// Full path from config text to running engines.
    #[tokio::test]
    async fn test_engines_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("archive.jsonl");
        let content = format!(
            r#"
[source]
bind = "127.0.0.1:0"

[[destinations]]
name = "debug"
strategy = "log"

[destinations.settings]
max_items_per_post = "50"

[[destinations]]
name = "archive"
strategy = "log"

[destinations.buffer]
backend = "file"
capacity = 200
path = "{}"
"#,
            snapshot.display()
        );

        let blueprint = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.destinations.len(), 2);

        let mut handles = Vec::new();
        for destination in &blueprint.destinations {
            handles.push(create_engine(destination).unwrap());
        }

        for handle in &handles {
            for t in 0..3u64 {
                handle.try_send(Record::new(t, 9, vec![3.3]));
            }
        }

        for handle in handles {
            let metrics = Arc::clone(handle.metrics());
            for _ in 0..50 {
                if metrics.delivered_count() >= 3 {
                    break;
                }
                sleep(Duration::from_millis(100)).await;
            }
            handle.shutdown().await;
            assert_eq!(metrics.snapshot().delivered_count, 3);
        }
    }
}

#[cfg(test)]
mod wire_contract_tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{BufferOptions, DestinationConfig, Record, StrategyType};
    use dispatcher::create_engine;
    use tokio::time::sleep;

    use crate::support::ack_server;

    fn bulk_destination(name: &str, settings: &[(&str, &str)]) -> DestinationConfig {
        DestinationConfig {
            name: name.into(),
            strategy: StrategyType::BulkJson,
            buffer: BufferOptions::default(),
            queue_capacity: 100,
            settings: settings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Scenario: send returns the `ok` token -> buffer empties.
    #[tokio::test]
    async fn test_acknowledged_batch_is_discarded() {
        let connections = Arc::new(AtomicU64::new(0));
        let addr = ack_server("ok", Arc::clone(&connections)).await;
        let url = format!("http://{addr}");

        let config = bulk_destination("acked", &[("url", &url), ("apikey", "abc123")]);
        let handle = create_engine(&config).unwrap();
        let metrics = Arc::clone(handle.metrics());

        handle.try_send(Record::new(100, 5, vec![21.0]));
        handle.try_send(Record::new(105, 5, vec![21.5]));

        for _ in 0..50 {
            if metrics.delivered_count() >= 2 {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }

        handle.shutdown().await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delivered_count, 2);
        assert_eq!(snapshot.buffer_depth, 0);
        assert!(connections.load(Ordering::SeqCst) >= 1);
    }

    /// Scenario: send returns something else -> both records retained.
    #[tokio::test]
    async fn test_rejected_batch_is_retained() {
        let connections = Arc::new(AtomicU64::new(0));
        let addr = ack_server("fail", Arc::clone(&connections)).await;
        let url = format!("http://{addr}");

        let config = bulk_destination("rejected", &[("url", &url), ("apikey", "abc123")]);
        let handle = create_engine(&config).unwrap();
        let metrics = Arc::clone(handle.metrics());

        handle.try_send(Record::new(100, 5, vec![21.0]));
        handle.try_send(Record::new(105, 5, vec![21.5]));

        for _ in 0..50 {
            if metrics.failure_count() >= 1 {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }

        handle.shutdown().await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delivered_count, 0);
        assert_eq!(snapshot.buffer_depth, 2, "failed batch must stay buffered");
        assert!(snapshot.failure_count >= 1);
    }

    /// Scenario: apikey unset -> buffer unchanged and no network call issued.
    #[tokio::test]
    async fn test_missing_apikey_makes_no_network_call() {
        let connections = Arc::new(AtomicU64::new(0));
        let addr = ack_server("ok", Arc::clone(&connections)).await;
        let url = format!("http://{addr}");

        let config = bulk_destination("unconfigured", &[("url", &url)]);
        let handle = create_engine(&config).unwrap();
        let metrics = Arc::clone(handle.metrics());

        handle.try_send(Record::new(100, 5, vec![21.0]));

        // Several loop cycles pass; the flush is skipped each time.
        sleep(Duration::from_millis(500)).await;

        handle.shutdown().await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.buffer_depth, 1);
        assert_eq!(snapshot.delivered_count, 0);
        assert_eq!(connections.load(Ordering::SeqCst), 0, "no request expected");
    }

    /// Settings hot-reload unblocks a paused destination.
    #[tokio::test]
    async fn test_hot_reload_unpauses_output() {
        let connections = Arc::new(AtomicU64::new(0));
        let addr = ack_server("ok", Arc::clone(&connections)).await;
        let url = format!("http://{addr}");

        let config = bulk_destination(
            "paused",
            &[("url", &url), ("apikey", "abc123"), ("pause", "out")],
        );
        let handle = create_engine(&config).unwrap();
        let metrics = Arc::clone(handle.metrics());

        handle.try_send(Record::new(100, 5, vec![21.0]));
        sleep(Duration::from_millis(400)).await;
        assert_eq!(metrics.delivered_count(), 0, "paused engine must not post");

        let update: HashMap<String, String> =
            HashMap::from([("pause".to_string(), String::new())]);
        handle.apply_settings(update).await;

        for _ in 0..50 {
            if metrics.delivered_count() >= 1 {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }

        handle.shutdown().await;
        assert_eq!(metrics.snapshot().delivered_count, 1);
    }
}

#[cfg(test)]
mod redaction_tests {
    use std::io;
    use std::sync::atomic::AtomicU64;
    use std::sync::{Arc, Mutex};

    use contracts::{BatchStrategy, EngineSettings, Record};
    use dispatcher::BulkJsonStrategy;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::support::ack_server;

    /// Captures log output for assertions
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogCapture {
        type Writer = LogCapture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// The request log line never contains the credential.
    #[tokio::test]
    async fn test_request_log_redacts_credential() {
        const APIKEY: &str = "secretkey123";

        let addr = ack_server("ok", Arc::new(AtomicU64::new(0))).await;

        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_max_level(tracing::Level::TRACE)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut strategy = BulkJsonStrategy::new("redaction").unwrap();
        let mut settings = EngineSettings::new();
        settings.extend_defaults(strategy.default_settings());
        settings.apply(
            "redaction",
            &std::collections::HashMap::from([
                ("url".to_string(), format!("http://{addr}")),
                ("apikey".to_string(), APIKEY.to_string()),
            ]),
        );

        let batch = vec![Record::new(100, 5, vec![21.0])];
        let outcome = strategy.process_batch(&batch, &settings).await;
        assert!(outcome.is_delivered());

        let logs = capture.contents();
        assert!(
            logs.contains("apikey="),
            "the request URL should be logged: {logs}"
        );
        assert!(
            !logs.contains(APIKEY),
            "the credential must never reach the logs"
        );
    }
}
