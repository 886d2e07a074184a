//! Dispatcher error types

use thiserror::Error;

use crate::transport::TransportError;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Engine creation error
    #[error("failed to create engine '{name}': {message}")]
    EngineCreation { name: String, message: String },

    /// Transport error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Contract-level error
    #[error("relay error: {0}")]
    Relay(#[from] contracts::RelayError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create an engine creation error
    pub fn engine_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
