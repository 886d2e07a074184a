//! Record - one timestamped sensor reading
//!
//! The unit of data flowing from producer to destination.

use serde::{Deserialize, Serialize};

/// One timestamped reading from a sensor node.
///
/// Immutable once created. The `reference` tag exists for local diagnostics
/// only: the engine strips it before the record reaches any buffer, and it is
/// never serialized onto the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Capture time, seconds since the Unix epoch
    pub timestamp: u64,

    /// Source node identifier
    pub node: u32,

    /// Reading values, in the order the node reported them
    pub values: Vec<f64>,

    /// Correlation tag for diagnostics (never persisted or transmitted)
    #[serde(skip)]
    pub reference: Option<String>,
}

impl Record {
    /// Create a record without a correlation tag
    pub fn new(timestamp: u64, node: u32, values: Vec<f64>) -> Self {
        Self {
            timestamp,
            node,
            values,
            reference: None,
        }
    }

    /// Attach a correlation tag
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Drop the correlation tag before the record leaves the engine
    pub fn without_reference(mut self) -> Self {
        self.reference = None;
        self
    }
}
