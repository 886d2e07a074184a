//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Delivery Model
//! - One `DispatchEngine` per destination, single loop, no shared mutable state
//! - Records are buffered until delivery is explicitly confirmed by the destination

mod blueprint;
mod buffer;
mod error;
mod record;
mod settings;
mod strategy;

pub use blueprint::*;
pub use buffer::RecordBuffer;
pub use error::*;
pub use record::Record;
pub use settings::{EngineSettings, PauseMode};
pub use strategy::*;
