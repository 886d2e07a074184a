//! Relay orchestrator - coordinates source, engines, and hot-reload.
//!
//! Owns the fan-out loop: every record from the reading source is offered to
//! every engine queue (non-blocking; a full queue drops for that destination
//! only). Settings hot-reload polls the config file mtime and pushes changed
//! destination settings to the running engines.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use dispatcher::{create_engine, EngineHandle, EngineMetrics, MetricsSnapshot};
use ingestion::{UdpReadingSource, UdpSourceConfig};
use contracts::RelayBlueprint;
use tracing::{info, warn};

use super::PipelineStats;

/// Cadence of Prometheus gauge/counter export from engine snapshots
const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The relay blueprint configuration
    pub blueprint: RelayBlueprint,

    /// Config file to watch for settings hot-reload (None = no reload)
    pub config_path: Option<PathBuf>,

    /// Seconds between reload checks (None = disabled)
    pub reload_interval: Option<Duration>,

    /// Relay timeout (None = run until stopped)
    pub timeout: Option<Duration>,

    /// Channel capacity between the source and the fan-out loop
    pub source_queue: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main relay orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the relay to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // One engine per destination; any construction fault aborts startup.
        let mut handles = Vec::with_capacity(blueprint.destinations.len());
        for destination in &blueprint.destinations {
            let handle = create_engine(destination)
                .with_context(|| format!("Failed to create engine '{}'", destination.name))?;
            handles.push(handle);
        }
        info!(engines = handles.len(), "Dispatch engines started");

        // Reading source
        let bind: SocketAddr = blueprint
            .source
            .bind
            .parse()
            .with_context(|| format!("Invalid source bind address '{}'", blueprint.source.bind))?;
        let source = UdpReadingSource::new(UdpSourceConfig { bind });
        let mut records = source
            .start(self.config.source_queue)
            .await
            .with_context(|| format!("Failed to bind reading source on {bind}"))?;
        info!(bind = %bind, "Reading source listening");

        // Settings hot-reload
        let mut reloader = match (&self.config.config_path, self.config.reload_interval) {
            (Some(path), Some(_)) => Some(SettingsReloader::new(path.clone())),
            _ => None,
        };
        let mut reload_tick = tokio::time::interval(
            self.config
                .reload_interval
                .unwrap_or(Duration::from_secs(86400)),
        );

        let mut metrics_tick = tokio::time::interval(METRICS_EXPORT_INTERVAL);
        let mut exporter = MetricsExporter::new(&handles);

        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut records_received: u64 = 0;

        loop {
            tokio::select! {
                maybe_record = records.recv() => match maybe_record {
                    Some(record) => {
                        records_received += 1;
                        for handle in &handles {
                            handle.try_send(record.clone());
                        }
                    }
                    None => {
                        warn!("Reading source closed, stopping relay");
                        break;
                    }
                },
                _ = reload_tick.tick(), if reloader.is_some() => {
                    if let Some(ref mut reloader) = reloader {
                        reloader.apply_if_changed(&handles).await;
                    }
                },
                _ = metrics_tick.tick() => {
                    exporter.export(&handles);
                },
                _ = &mut deadline => {
                    info!("Relay timeout reached");
                    break;
                }
            }
        }

        // Orderly teardown: stop the source, then each engine (letting
        // in-flight sends finish and queues drain into buffers).
        source.stop();

        let mut engines = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = handle.name().to_string();
            let metrics: Arc<EngineMetrics> = Arc::clone(handle.metrics());
            handle.shutdown().await;
            engines.push((name, metrics.snapshot()));
        }

        Ok(PipelineStats {
            records_received,
            duration: start_time.elapsed(),
            engines,
        })
    }
}

/// Applies settings from a changed config file to running engines
struct SettingsReloader {
    path: PathBuf,
    last_mtime: Option<SystemTime>,
}

impl SettingsReloader {
    fn new(path: PathBuf) -> Self {
        let last_mtime = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self { path, last_mtime }
    }

    /// Re-read the config when its mtime moved and push per-destination
    /// settings to the matching engines. An invalid file is ignored with a
    /// warning; the engines keep their current settings.
    async fn apply_if_changed(&mut self, handles: &[EngineHandle]) {
        let mtime = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot stat config file");
                return;
            }
        };
        if self.last_mtime == Some(mtime) {
            return;
        }
        self.last_mtime = Some(mtime);

        match config_loader::ConfigLoader::load_from_path(&self.path) {
            Ok(blueprint) => {
                info!(path = %self.path.display(), "Configuration changed, applying settings");
                for destination in blueprint.destinations {
                    match handles.iter().find(|h| h.name() == destination.name) {
                        Some(handle) => {
                            handle.apply_settings(destination.settings).await;
                        }
                        None => warn!(
                            destination = %destination.name,
                            "New destination in reloaded config requires a restart"
                        ),
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Ignoring invalid configuration reload");
            }
        }
    }
}

/// Exports engine metric deltas to the Prometheus recorder
struct MetricsExporter {
    last: Vec<MetricsSnapshot>,
}

impl MetricsExporter {
    fn new(handles: &[EngineHandle]) -> Self {
        Self {
            last: handles.iter().map(|h| h.metrics().snapshot()).collect(),
        }
    }

    fn export(&mut self, handles: &[EngineHandle]) {
        for (handle, last) in handles.iter().zip(self.last.iter_mut()) {
            let snapshot = handle.metrics().snapshot();
            let name = handle.name();

            observability::record_buffer_depth(name, snapshot.buffer_depth);
            observability::record_readings_buffered(
                name,
                snapshot.buffered_count - last.buffered_count,
            );
            observability::record_readings_delivered(
                name,
                snapshot.delivered_count - last.delivered_count,
            );
            observability::record_post_failures(
                name,
                snapshot.failure_count - last.failure_count,
            );
            observability::record_queue_dropped(
                name,
                snapshot.dropped_count - last.dropped_count,
            );

            *last = snapshot;
        }
    }
}
