//! DispatchEngine - the buffering + interval-driven flush core
//!
//! One engine instance owns one destination: it drains an inbound record
//! queue into a pending-record buffer, and on a cadence evaluates its
//! pause/interval gates and flushes a bounded batch through the configured
//! `BatchStrategy`. A batch is discarded from the buffer only after the
//! strategy reports explicit delivery, so no data is ever lost to a failed
//! send.
//!
//! Everything here runs on a single loop: buffer mutation, timer updates and
//! settings changes all happen on the engine's own task, so no locking is
//! needed. A send blocks the loop for up to the transport timeout, which is
//! intentional backpressure; the queue keeps filling the buffer meanwhile.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{BatchStrategy, DeliveryOutcome, DestinationConfig, EngineSettings, Record, RecordBuffer};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::buffers::create_buffer;
use crate::error::DispatcherError;
use crate::metrics::EngineMetrics;

/// Loop pacing quantum: bounds CPU usage and sets the responsiveness floor
const POLL_QUANTUM: Duration = Duration::from_millis(100);

/// Store-and-forward engine for one destination
pub struct DispatchEngine<S: BatchStrategy> {
    name: String,
    inbound: mpsc::Receiver<Record>,
    settings_rx: mpsc::Receiver<HashMap<String, String>>,
    stop: Arc<AtomicBool>,
    buffer: Box<dyn RecordBuffer>,
    strategy: S,
    settings: EngineSettings,
    /// Absolute per-flush ceiling, fixed at construction
    item_limit: usize,
    /// Advanced only after a confirmed successful flush
    last_flush: Option<Instant>,
    /// Advanced only after a confirmed periodic task
    last_announce: Option<Instant>,
    metrics: Arc<EngineMetrics>,
}

impl<S: BatchStrategy> DispatchEngine<S> {
    /// Build an engine for one destination.
    ///
    /// Applies base defaults, the strategy's defaults, then the configured
    /// overrides. Invalid configuration is a fatal construction error; the
    /// loop never starts in that case.
    pub fn new(
        config: &DestinationConfig,
        inbound: mpsc::Receiver<Record>,
        settings_rx: mpsc::Receiver<HashMap<String, String>>,
        stop: Arc<AtomicBool>,
        strategy: S,
    ) -> Result<Self, DispatcherError> {
        let buffer = create_buffer(&config.name, &config.buffer)?;

        let mut settings = EngineSettings::new();
        settings.extend_defaults(strategy.default_settings());
        settings.apply(&config.name, &config.settings);

        let item_limit = strategy
            .item_limit()
            .unwrap_or(config.buffer.capacity);

        info!(
            engine = %config.name,
            strategy = strategy.name(),
            backend = ?config.buffer.backend,
            capacity = config.buffer.capacity,
            item_limit,
            "set up dispatch engine"
        );

        Ok(Self {
            name: config.name.clone(),
            inbound,
            settings_rx,
            stop,
            buffer,
            strategy,
            settings,
            item_limit,
            last_flush: None,
            last_announce: None,
            metrics: Arc::new(EngineMetrics::new()),
        })
    }

    /// Engine name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Current pending-record count
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Run the engine loop until the stop flag is observed.
    ///
    /// Each cycle: drain settings updates and the inbound queue, sleep one
    /// quantum, then evaluate gates and flush. In-flight sends complete
    /// before the flag is re-checked.
    pub async fn run(mut self) {
        info!(engine = %self.name, "dispatch engine started");

        while !self.stop.load(Ordering::Relaxed) {
            self.drain_settings();
            self.drain_inbound();
            tokio::time::sleep(POLL_QUANTUM).await;
            self.action().await;
        }

        // Final drain so queued records reach the buffer (and a persistent
        // backend) before the task ends.
        self.drain_queue();

        info!(
            engine = %self.name,
            pending = self.buffer.len(),
            "dispatch engine stopped"
        );
    }

    /// Apply any pending settings updates
    fn drain_settings(&mut self) {
        while let Ok(update) = self.settings_rx.try_recv() {
            self.settings.apply(&self.name, &update);
        }
    }

    /// Drain the inbound queue unless input is paused
    fn drain_inbound(&mut self) {
        if !self.settings.pause().allows_input() {
            return;
        }
        self.drain_queue();
    }

    fn drain_queue(&mut self) {
        while let Ok(record) = self.inbound.try_recv() {
            self.add(record);
        }
    }

    /// Append one record to the buffer, stripping its correlation tag.
    ///
    /// Never fails the caller; overflow is the buffer's concern.
    fn add(&mut self, record: Record) {
        debug!(
            engine = %self.name,
            timestamp = record.timestamp,
            node = record.node,
            values = ?record.values,
            reference = record.reference.as_deref().unwrap_or("-"),
            "append to buffer"
        );
        self.buffer.store_item(record.without_reference());
        self.metrics.inc_buffered();
        self.metrics.set_buffer_depth(self.buffer.len());
    }

    /// One gated action cycle: flush if due, then the strategy's periodic
    /// task on its own timer (independent of the pause flag).
    async fn action(&mut self) {
        if self.settings.pause().allows_output() && self.flush_due() {
            self.flush().await;
        }
        self.run_periodic_task().await;
    }

    /// Whether the interval gate allows a flush now
    fn flush_due(&self) -> bool {
        let interval = self.settings.interval_secs();
        if interval == 0 {
            return true;
        }
        match self.last_flush {
            None => true,
            Some(at) => at.elapsed() >= Duration::from_secs(interval),
        }
    }

    /// Retrieve a bounded batch, post it, and discard it only on explicit
    /// delivery. On any other outcome the batch stays in the buffer, in
    /// order, for the next eligible cycle.
    async fn flush(&mut self) {
        if !self.buffer.has_items() {
            return;
        }

        let configured = self.settings.max_items_per_post();
        if configured <= 0 {
            // Flush disabled by configuration.
            return;
        }
        let max_items = (configured as usize).min(self.item_limit);

        let batch = self.buffer.retrieve_items(max_items);
        let retrieved = batch.len();

        match self.strategy.process_batch(&batch, &self.settings).await {
            DeliveryOutcome::Delivered => {
                // Discard exactly what was retrieved, only after confirmation.
                self.buffer.discard_oldest(retrieved);
                self.last_flush = Some(Instant::now());
                self.metrics.add_delivered(retrieved as u64);
                debug!(engine = %self.name, items = retrieved, "batch delivered and discarded");
            }
            DeliveryOutcome::Rejected => {
                self.metrics.inc_failure();
                debug!(engine = %self.name, items = retrieved, "batch retained for retry");
            }
            DeliveryOutcome::Skipped => {
                trace!(engine = %self.name, "flush skipped by strategy");
            }
        }

        self.metrics.set_buffer_depth(self.buffer.len());
    }

    /// Run the strategy's out-of-band task when its own interval has elapsed
    async fn run_periodic_task(&mut self) {
        let Some(interval) = self.strategy.announce_interval(&self.settings) else {
            return;
        };
        let due = match self.last_announce {
            None => true,
            Some(at) => at.elapsed() >= Duration::from_secs(interval),
        };
        if !due {
            return;
        }
        if self.strategy.periodic_task(&self.settings).await {
            self.last_announce = Some(Instant::now());
        }
    }
}
