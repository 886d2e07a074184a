//! Mock reading source
//!
//! Generates synthetic records for tests and demos, no network required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use contracts::Record;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    /// Node identifier stamped on every record
    pub node: u32,

    /// Emission rate (Hz)
    pub frequency_hz: f64,

    /// Base reading values; each emission adds a small deterministic drift
    pub base_values: Vec<f64>,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            node: 10,
            frequency_hz: 10.0,
            base_values: vec![21.0, 230.0],
        }
    }
}

/// Reading source that emits synthetic records at a fixed rate
pub struct MockReadingSource {
    config: MockSourceConfig,
    running: Arc<AtomicBool>,
}

impl MockReadingSource {
    /// Create a new mock source
    pub fn new(config: MockSourceConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a mock source for a single node
    pub fn node(node: u32, frequency_hz: f64, base_values: Vec<f64>) -> Self {
        Self::new(MockSourceConfig {
            node,
            frequency_hz,
            base_values,
        })
    }

    /// Start the source, returning the record stream receiver
    pub fn start(&self, channel_capacity: usize) -> mpsc::Receiver<Record> {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let config = self.config.clone();
        let running = self.running.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let interval = Duration::from_secs_f64(1.0 / config.frequency_hz);
            let mut seq: u64 = 0;

            debug!(
                node = config.node,
                frequency_hz = config.frequency_hz,
                "mock reading source started"
            );

            while running.load(Ordering::Relaxed) {
                seq += 1;
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);

                let values: Vec<f64> = config
                    .base_values
                    .iter()
                    .map(|base| base + (seq % 10) as f64 * 0.1)
                    .collect();

                let record = Record::new(timestamp, config.node, values)
                    .with_reference(format!("mock#{seq}"));

                metrics::counter!("uplink_readings_received_total").increment(1);

                if tx.send(record).await.is_err() {
                    debug!(node = config.node, "mock source channel closed");
                    break;
                }

                trace!(node = config.node, seq, "mock record sent");

                tokio::time::sleep(interval).await;
            }

            debug!(node = config.node, "mock reading source stopped");
        });

        rx
    }

    /// Stop the source
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the source is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
