//! RelayBlueprint - Config Loader output
//!
//! Describes the complete relay deployment: the reading source and one
//! delivery destination per engine instance.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Reading source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Delivery destinations, one engine instance each
    pub destinations: Vec<DestinationConfig>,
}

/// Reading source configuration (UDP line protocol)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listen address for the UDP reading source
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5005".to_string()
}

/// One delivery destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Unique destination name
    pub name: String,

    /// Delivery strategy
    pub strategy: StrategyType,

    /// Pending-record buffer backend
    #[serde(default)]
    pub buffer: BufferOptions,

    /// Inbound queue capacity (producer -> engine channel)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Hot-reloadable engine settings (pause, interval, url, apikey, ...)
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Delivery strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Log each batch (diagnostics destination)
    Log,
    /// Bulk JSON posting with api-key auth
    BulkJson,
}

/// Buffer backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferBackend {
    /// In-memory, bounded, drops oldest on overflow
    #[default]
    Memory,
    /// JSON-lines snapshot on disk; survives restarts
    File,
}

/// Buffer backend options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferOptions {
    /// Backend selector
    #[serde(default)]
    pub backend: BufferBackend,

    /// Maximum pending records
    #[serde(default = "default_buffer_capacity")]
    pub capacity: usize,

    /// Snapshot path (file backend only)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            backend: BufferBackend::Memory,
            capacity: default_buffer_capacity(),
            path: None,
        }
    }
}

fn default_buffer_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_defaults() {
        let json = r#"{ "name": "primary", "strategy": "bulk_json" }"#;
        let dest: DestinationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(dest.name, "primary");
        assert_eq!(dest.strategy, StrategyType::BulkJson);
        assert_eq!(dest.buffer.backend, BufferBackend::Memory);
        assert_eq!(dest.buffer.capacity, 1000);
        assert_eq!(dest.queue_capacity, 100);
        assert!(dest.settings.is_empty());
    }

    #[test]
    fn file_backend_round_trip() {
        let dest = DestinationConfig {
            name: "archive".into(),
            strategy: StrategyType::Log,
            buffer: BufferOptions {
                backend: BufferBackend::File,
                capacity: 5000,
                path: Some(PathBuf::from("/var/lib/uplink/archive.jsonl")),
            },
            queue_capacity: 50,
            settings: HashMap::from([("interval".to_string(), "30".to_string())]),
        };

        let json = serde_json::to_string(&dest).unwrap();
        let back: DestinationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.buffer.backend, BufferBackend::File);
        assert_eq!(back.buffer.capacity, 5000);
        assert_eq!(back.settings.get("interval").map(String::as_str), Some("30"));
    }

    #[test]
    fn source_defaults() {
        let source = SourceConfig::default();
        assert_eq!(source.bind, "0.0.0.0:5005");
    }
}
