//! Mock Relay Demo
//!
//! Runs the full relay path without a network: mock reading sources fan out
//! to two engines, one log destination and one bulk destination that skips
//! every flush because its api key is not configured (so pending records stay
//! buffered, demonstrating the retention contract).
//!
//! Run with: cargo run --bin mock_pipeline

use std::sync::Arc;
use std::time::Duration;

use contracts::{BufferOptions, DestinationConfig, RelayBlueprint, StrategyType};
use dispatcher::create_engine;
use ingestion::MockReadingSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Relay Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading relay config");
        config_loader::ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_demo_blueprint()
    };

    // ==== Stage 2: Start one engine per destination ====
    let mut handles = Vec::new();
    for destination in &blueprint.destinations {
        let handle = create_engine(destination)?;
        tracing::info!(engine = handle.name(), "Engine started");
        handles.push(handle);
    }

    // ==== Stage 3: Start mock sources ====
    let heating = MockReadingSource::node(10, 20.0, vec![21.0, 230.0]);
    let solar = MockReadingSource::node(11, 5.0, vec![1850.0]);

    let mut heating_rx = heating.start(100);
    let mut solar_rx = solar.start(100);

    // ==== Stage 4: Fan out for a fixed demo window ====
    let target_records = 100u64;
    tracing::info!(target = target_records, "Running relay");

    let mut received = 0u64;
    let window = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(window);

    while received < target_records {
        tokio::select! {
            Some(record) = heating_rx.recv() => {
                received += 1;
                for handle in &handles {
                    handle.try_send(record.clone());
                }
            }
            Some(record) = solar_rx.recv() => {
                received += 1;
                for handle in &handles {
                    handle.try_send(record.clone());
                }
            }
            _ = &mut window => {
                tracing::warn!("Demo window elapsed before target");
                break;
            }
        }
    }

    heating.stop();
    solar.stop();

    // Give the engines a few cycles to drain and flush.
    tokio::time::sleep(Duration::from_millis(500)).await;

    // ==== Stage 5: Shutdown and report ====
    for handle in handles {
        let name = handle.name().to_string();
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        let snapshot = metrics.snapshot();
        tracing::info!(
            engine = %name,
            buffered = snapshot.buffered_count,
            delivered = snapshot.delivered_count,
            pending = snapshot.buffer_depth,
            "Engine finished"
        );
    }

    tracing::info!(records = received, "Demo completed");
    Ok(())
}

fn create_demo_blueprint() -> RelayBlueprint {
    use std::collections::HashMap;

    RelayBlueprint {
        version: Default::default(),
        source: Default::default(),
        destinations: vec![
            DestinationConfig {
                name: "debug_log".to_string(),
                strategy: StrategyType::Log,
                buffer: BufferOptions::default(),
                queue_capacity: 100,
                settings: HashMap::new(),
            },
            DestinationConfig {
                name: "unconfigured_bulk".to_string(),
                strategy: StrategyType::BulkJson,
                buffer: BufferOptions {
                    capacity: 500,
                    ..Default::default()
                },
                queue_capacity: 100,
                // No apikey: flushes are skipped and records accumulate,
                // showing the retention behavior.
                settings: HashMap::from([("interval".to_string(), "5".to_string())]),
            },
        ],
    }
}
