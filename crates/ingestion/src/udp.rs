//! UDP reading source
//!
//! Listens for line-protocol datagrams, one frame per datagram. Each frame is
//! stamped with its arrival time and a `peer#seq` correlation tag.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use contracts::Record;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::frame::parse_frame;

/// UDP source configuration
#[derive(Debug, Clone)]
pub struct UdpSourceConfig {
    /// Listen address
    pub bind: SocketAddr,
}

/// Reading source backed by a UDP socket
pub struct UdpReadingSource {
    config: UdpSourceConfig,
    running: Arc<AtomicBool>,
}

impl UdpReadingSource {
    /// Create a new UDP source
    pub fn new(config: UdpSourceConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bind the socket and start receiving, returning the record stream.
    ///
    /// Binding happens before the task is spawned so an unusable address is a
    /// visible startup error rather than a background log line.
    pub async fn start(&self, channel_capacity: usize) -> std::io::Result<mpsc::Receiver<Record>> {
        let socket = UdpSocket::bind(self.config.bind).await?;
        let local = socket.local_addr()?;
        let (tx, rx) = mpsc::channel(channel_capacity);
        let running = self.running.clone();

        running.store(true, Ordering::SeqCst);

        debug!(addr = %local, "udp reading source listening");

        tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            let mut seq: u64 = 0;

            while running.load(Ordering::Relaxed) {
                let (len, peer) = tokio::select! {
                    received = socket.recv_from(&mut buf) => match received {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "udp receive failed");
                            continue;
                        }
                    },
                    // Wake periodically so the stop flag is observed even
                    // while the socket is idle.
                    _ = tokio::time::sleep(Duration::from_millis(500)) => continue,
                };

                seq += 1;
                let line = String::from_utf8_lossy(&buf[..len]);
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);

                match parse_frame(&line, timestamp, format!("{peer}#{seq}")) {
                    Ok(record) => {
                        metrics::counter!("uplink_readings_received_total").increment(1);
                        if tx.send(record).await.is_err() {
                            debug!("udp source channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        metrics::counter!("uplink_frame_parse_failures_total").increment(1);
                        warn!(peer = %peer, error = %e, frame = %line.trim(), "discarding unparsable frame");
                    }
                }
            }

            debug!(addr = %local, "udp reading source stopped");
        });

        Ok(rx)
    }

    /// Stop the source
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the source is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_source_receives_frames() {
        // Reserve an ephemeral port, release it, then start the source on it.
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = probe.local_addr().unwrap();
        drop(probe);

        let source = UdpReadingSource::new(UdpSourceConfig { bind: target });
        let mut rx = source.start(10).await.unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"10 150 3450", target).await.unwrap();
        sender.send_to(b"garbage frame", target).await.unwrap();
        sender.send_to(b"5 21.5", target).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.node, 10);
        assert_eq!(first.values, vec![150.0, 3450.0]);

        // The malformed frame is dropped; the next record is node 5.
        let second = rx.recv().await.unwrap();
        assert_eq!(second.node, 5);

        source.stop();
    }

    #[tokio::test]
    async fn test_udp_source_bind_failure_is_visible() {
        // TEST-NET-1 is never assigned locally, so the bind must fail.
        let source = UdpReadingSource::new(UdpSourceConfig {
            bind: "192.0.2.1:9".parse().unwrap(),
        });
        let result = source.start(10).await;
        assert!(result.is_err());
    }
}
