//! RecordBuffer trait - pending-record store interface
//!
//! Defines the abstract interface for buffer backends.

use crate::Record;

/// FIFO store of pending, not-yet-confirmed-delivered records.
///
/// Backends differ only in persistence and overflow policy. The engine drives
/// every buffer through a two-phase protocol: `retrieve_items` is a
/// non-destructive read of the oldest records, and `discard_oldest` removes
/// exactly the count last retrieved, only after the engine has confirmed
/// delivery of that exact batch. A single engine loop owns each buffer, so
/// implementations need no internal locking.
pub trait RecordBuffer: Send {
    /// Buffer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append a record at the tail.
    ///
    /// Must not fail the caller; overflow handling (drop oldest, reject,
    /// grow) is backend-defined.
    fn store_item(&mut self, record: Record);

    /// Whether any records are pending
    fn has_items(&self) -> bool;

    /// Number of pending records
    fn len(&self) -> usize;

    /// Non-destructive read of up to `max_count` oldest records, FIFO order
    fn retrieve_items(&self, max_count: usize) -> Vec<Record>;

    /// Remove the `count` oldest records.
    ///
    /// `count` must not exceed the length last retrieved; implementations
    /// clamp to the current length.
    fn discard_oldest(&mut self, count: usize);
}
