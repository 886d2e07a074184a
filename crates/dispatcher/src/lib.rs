//! # Dispatcher
//!
//! Store-and-forward delivery core.
//!
//! Responsibilities:
//! - Drain the inbound record queue into a pending-record buffer
//! - Gate flushes on pause/interval settings
//! - Post batches through a pluggable `BatchStrategy`, discarding a batch
//!   from the buffer only after the destination confirms it

pub mod buffers;
pub mod engine;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod strategies;
pub mod transport;

pub use contracts::{BatchStrategy, DeliveryOutcome, EngineSettings, PauseMode, Record};
pub use buffers::{create_buffer, FileBuffer, MemoryBuffer};
pub use engine::DispatchEngine;
pub use error::DispatcherError;
pub use handle::{create_engine, EngineHandle};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use strategies::{BulkJsonStrategy, LogStrategy};
pub use transport::{HttpTransport, TransportError};
