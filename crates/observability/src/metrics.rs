//! Delivery pipeline metric recorders
//!
//! Free functions wrapping the `metrics` macros. Counters take deltas so a
//! caller can export from periodic snapshots without double counting.

use metrics::{counter, gauge};

/// Record readings appended to a destination buffer
pub fn record_readings_buffered(destination: &str, count: u64) {
    if count == 0 {
        return;
    }
    counter!(
        "uplink_readings_buffered_total",
        "destination" => destination.to_string()
    )
    .increment(count);
}

/// Record readings confirmed delivered and discarded
pub fn record_readings_delivered(destination: &str, count: u64) {
    if count == 0 {
        return;
    }
    counter!(
        "uplink_readings_delivered_total",
        "destination" => destination.to_string()
    )
    .increment(count);
}

/// Record failed batch posts (batch retained each time)
pub fn record_post_failures(destination: &str, count: u64) {
    if count == 0 {
        return;
    }
    counter!(
        "uplink_post_failures_total",
        "destination" => destination.to_string()
    )
    .increment(count);
}

/// Record readings dropped at a full inbound queue
pub fn record_queue_dropped(destination: &str, count: u64) {
    if count == 0 {
        return;
    }
    counter!(
        "uplink_queue_dropped_total",
        "destination" => destination.to_string()
    )
    .increment(count);
}

/// Record the current pending-record buffer depth
pub fn record_buffer_depth(destination: &str, depth: usize) {
    gauge!(
        "uplink_buffer_depth",
        "destination" => destination.to_string()
    )
    .set(depth as f64);
}
