//! LogStrategy - logs batch summaries via tracing
//!
//! A diagnostics destination: every batch is "delivered" to the log.

use contracts::{BatchStrategy, DeliveryOutcome, EngineSettings, Record};
use tracing::info;

/// Strategy that logs batch summaries for debugging
pub struct LogStrategy {
    name: String,
}

impl LogStrategy {
    /// Create a new LogStrategy with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BatchStrategy for LogStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_settings(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn item_limit(&self) -> Option<usize> {
        None
    }

    async fn process_batch(
        &mut self,
        batch: &[Record],
        _settings: &EngineSettings,
    ) -> DeliveryOutcome {
        let first_timestamp = batch.first().map(|r| r.timestamp).unwrap_or(0);
        info!(
            strategy = %self.name,
            items = batch.len(),
            first_timestamp,
            "batch received"
        );
        DeliveryOutcome::Delivered
    }

    fn announce_interval(&self, _settings: &EngineSettings) -> Option<u64> {
        None
    }

    async fn periodic_task(&mut self, _settings: &EngineSettings) -> bool {
        false
    }
}
