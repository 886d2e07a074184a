//! BatchStrategy trait - pluggable destination-specific delivery logic
//!
//! A `DispatchEngine` is parameterized over one strategy, selected at
//! construction. The strategy encodes a batch into a destination-specific
//! request, interprets the response, and reports the outcome; it may also
//! declare a periodic out-of-band task (e.g. a liveness announce).

use crate::{EngineSettings, Record};

/// Result of handing one batch to a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The destination acknowledged the batch; the engine may discard it
    Delivered,
    /// The destination was unreachable or refused the batch; retain for retry
    Rejected,
    /// No send was attempted (e.g. credential missing); retain silently
    Skipped,
}

impl DeliveryOutcome {
    /// True only for an explicit acknowledgement
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Destination-specific encode/send/interpret logic.
///
/// All strategy implementations must implement this trait.
#[trait_variant::make(BatchStrategy: Send)]
pub trait LocalBatchStrategy {
    /// Strategy name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Extra default settings merged into the engine at construction
    fn default_settings(&self) -> Vec<(String, String)>;

    /// Absolute per-flush item ceiling; `None` defers to the buffer capacity
    fn item_limit(&self) -> Option<usize>;

    /// Encode and deliver one batch.
    ///
    /// Must never panic or propagate transport faults; failures are reported
    /// through the returned outcome so the engine retains the batch.
    async fn process_batch(
        &mut self,
        batch: &[Record],
        settings: &EngineSettings,
    ) -> DeliveryOutcome;

    /// Cadence of the periodic out-of-band task in seconds.
    ///
    /// `None` disables the task (the common case).
    fn announce_interval(&self, settings: &EngineSettings) -> Option<u64>;

    /// Periodic out-of-band task; returns true when the remote confirmed it
    async fn periodic_task(&mut self, settings: &EngineSettings) -> bool;
}
