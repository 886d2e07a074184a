//! EngineHandle - manages a dispatch engine worker task
//!
//! The producer-facing side of an engine: a non-blocking record sender, a
//! settings channel for hot-reload, shared metrics, and cooperative shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{BatchStrategy, DestinationConfig, Record, StrategyType};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::engine::DispatchEngine;
use crate::error::DispatcherError;
use crate::metrics::EngineMetrics;
use crate::strategies::{BulkJsonStrategy, LogStrategy};

/// Handle to a running engine worker
pub struct EngineHandle {
    /// Engine name
    name: String,
    /// Channel feeding records to the worker
    tx: mpsc::Sender<Record>,
    /// Channel feeding settings updates to the worker
    settings_tx: mpsc::Sender<HashMap<String, String>>,
    /// Cooperative stop flag, checked once per loop iteration
    stop: Arc<AtomicBool>,
    /// Shared metrics
    metrics: Arc<EngineMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl EngineHandle {
    /// Build the engine and spawn its worker task
    pub fn spawn<S: BatchStrategy + 'static>(
        config: &DestinationConfig,
        strategy: S,
    ) -> Result<Self, DispatcherError> {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let (settings_tx, settings_rx) = mpsc::channel(8);
        let stop = Arc::new(AtomicBool::new(false));

        let engine = DispatchEngine::new(config, rx, settings_rx, Arc::clone(&stop), strategy)?;
        let metrics = engine.metrics();

        let worker_handle = tokio::spawn(engine.run());

        Ok(Self {
            name: config.name.clone(),
            tx,
            settings_tx,
            stop,
            metrics,
            worker_handle,
        })
    }

    /// Get engine name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Send a record to the engine (non-blocking)
    ///
    /// Returns true if queued, false if the queue is full (record dropped)
    pub fn try_send(&self, record: Record) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(r)) => {
                self.metrics.inc_dropped();
                warn!(
                    engine = %self.name,
                    node = r.node,
                    "queue full, record dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(engine = %self.name, "engine worker closed unexpectedly");
                false
            }
        }
    }

    /// Queue a settings update for the engine loop to apply
    pub async fn apply_settings(&self, settings: HashMap<String, String>) -> bool {
        self.settings_tx.send(settings).await.is_ok()
    }

    /// Shutdown the engine gracefully.
    ///
    /// Sets the stop flag and waits for the worker; any in-flight send
    /// completes first, and queued records are drained into the buffer.
    pub async fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Err(e) = self.worker_handle.await {
            error!(engine = %self.name, error = ?e, "worker task panicked");
        }
        debug!(engine = %self.name, "engine handle shutdown complete");
    }
}

/// Create an engine handle from destination configuration
pub fn create_engine(config: &DestinationConfig) -> Result<EngineHandle, DispatcherError> {
    match config.strategy {
        StrategyType::Log => EngineHandle::spawn(config, LogStrategy::new(&config.name)),
        StrategyType::BulkJson => {
            let strategy = BulkJsonStrategy::new(&config.name)
                .map_err(|e| DispatcherError::engine_creation(&config.name, e.to_string()))?;
            EngineHandle::spawn(config, strategy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BufferOptions;
    use tokio::time::{sleep, Duration};

    fn destination(name: &str, queue_capacity: usize) -> DestinationConfig {
        DestinationConfig {
            name: name.into(),
            strategy: StrategyType::Log,
            buffer: BufferOptions::default(),
            queue_capacity,
            settings: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_handle_delivers_via_log_strategy() {
        let mut config = destination("test", 16);
        config
            .settings
            .insert("max_items_per_post".to_string(), "10".to_string());
        let handle = create_engine(&config).unwrap();

        for t in 0..5u64 {
            assert!(handle.try_send(Record::new(t, 1, vec![1.0])));
        }

        // Give the loop a few quanta to drain and flush.
        for _ in 0..30 {
            if handle.metrics().delivered_count() >= 5 {
                break;
            }
            sleep(Duration::from_millis(100)).await;
        }

        let snapshot = handle.metrics().snapshot();
        assert_eq!(snapshot.buffered_count, 5);
        assert_eq!(snapshot.delivered_count, 5);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_handle_queue_full_drops() {
        let config = destination("tiny", 2);
        let handle = create_engine(&config).unwrap();

        // Stop flag not set, but the loop sleeps 100ms between drains, so a
        // quick burst can overflow the 2-slot queue.
        let mut accepted = 0;
        for t in 0..50u64 {
            if handle.try_send(Record::new(t, 1, vec![1.0])) {
                accepted += 1;
            }
        }
        assert!(accepted < 50);
        assert!(handle.metrics().dropped_count() > 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_handle_settings_hot_reload() {
        let config = destination("reload", 16);
        let handle = create_engine(&config).unwrap();

        let update = HashMap::from([("pause".to_string(), "out".to_string())]);
        assert!(handle.apply_settings(update).await);

        sleep(Duration::from_millis(250)).await;

        // Records accumulate but are not flushed while output is paused.
        handle.try_send(Record::new(1, 1, vec![1.0]));
        sleep(Duration::from_millis(250)).await;

        let snapshot = handle.metrics().snapshot();
        assert_eq!(snapshot.buffered_count, 1);
        assert_eq!(snapshot.delivered_count, 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_create_engine_construction_fault() {
        let mut config = destination("broken", 16);
        config.buffer = BufferOptions {
            capacity: 0,
            ..Default::default()
        };
        assert!(create_engine(&config).is_err());
    }
}
