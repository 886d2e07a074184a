//! # Ingestion
//!
//! Producer side of the relay: reading sources that emit `Record`s into an
//! mpsc channel for the orchestrator to fan out to dispatch engines.
//!
//! Responsibilities:
//! - Parse the line protocol (`node v1 v2 ...`)
//! - UDP reading source for real deployments
//! - Mock reading source for tests and demos

mod frame;
mod mock;
mod udp;

pub use frame::{parse_frame, FrameError};
pub use mock::{MockReadingSource, MockSourceConfig};
pub use udp::{UdpReadingSource, UdpSourceConfig};
