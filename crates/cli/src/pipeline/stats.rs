//! Relay run statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total records received from the reading source
    pub records_received: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Final per-engine metrics, captured after shutdown
    pub engines: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    /// Records received per second
    pub fn rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.records_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Relay Statistics ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Records received: {}", self.records_received);
        println!("Rate: {:.2} records/s", self.rate());

        println!("\nEngines ({}):", self.engines.len());
        for (name, snapshot) in &self.engines {
            println!("  {}", name);
            println!("    Buffered: {}", snapshot.buffered_count);
            println!("    Delivered: {}", snapshot.delivered_count);
            println!("    Pending: {}", snapshot.buffer_depth);
            println!("    Post failures: {}", snapshot.failure_count);
            println!("    Queue drops: {}", snapshot.dropped_count);
        }

        println!();
    }
}
