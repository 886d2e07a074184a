//! BulkJsonStrategy - bulk JSON posting with api-key auth
//!
//! Posts batches as a compact JSON array of `[timestamp, node, values...]`
//! rows and treats the literal response body `ok` as the acknowledgement.
//! Also performs a periodic liveness announce on its own interval timer.

use std::time::{SystemTime, UNIX_EPOCH};

use contracts::{BatchStrategy, DeliveryOutcome, EngineSettings, Record};
use tracing::{debug, info, trace, warn};

use crate::transport::{HttpTransport, TransportError};

/// Acknowledgement token the bulk endpoint returns on success
const ACK_TOKEN: &str = "ok";

/// Substring that confirms a successful address announce
const ANNOUNCE_CONFIRMATION: &str = "\"IP address set to: ";

/// Hard ceiling on items per post, sized for bulk JSON payloads
const ITEM_LIMIT: usize = 250;

/// Strategy that delivers batches to a bulk JSON ingest endpoint
pub struct BulkJsonStrategy {
    name: String,
    transport: HttpTransport,
}

impl BulkJsonStrategy {
    /// Create a new BulkJsonStrategy with the given name
    pub fn new(name: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self {
            name: name.into(),
            transport: HttpTransport::new()?,
        })
    }

    /// Credential from settings, unless missing or a known placeholder
    fn usable_apikey<'a>(settings: &'a EngineSettings) -> Option<&'a str> {
        let apikey = settings.get("apikey")?;
        if apikey.is_empty() {
            return None;
        }
        let placeholder = apikey
            .get(..4)
            .map(|prefix| prefix.eq_ignore_ascii_case("xxxx"))
            .unwrap_or(false);
        if placeholder {
            None
        } else {
            Some(apikey)
        }
    }

    fn base_url<'a>(settings: &'a EngineSettings) -> &'a str {
        settings.get("url").unwrap_or("").trim_end_matches('/')
    }
}

/// Encode a batch as a compact JSON array of `[timestamp, node, values...]` rows
fn encode_batch(batch: &[Record]) -> String {
    let rows: Vec<serde_json::Value> = batch
        .iter()
        .map(|record| {
            let mut row = vec![
                serde_json::json!(record.timestamp),
                serde_json::json!(record.node),
            ];
            row.extend(record.values.iter().map(|v| serde_json::json!(v)));
            serde_json::Value::Array(row)
        })
        .collect();
    serde_json::Value::Array(rows).to_string()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl BatchStrategy for BulkJsonStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_settings(&self) -> Vec<(String, String)> {
        vec![
            ("max_items_per_post".into(), "100".into()),
            ("url".into(), "http://emoncms.org".into()),
            ("announce".into(), String::new()),
            ("announce_interval".into(), "3600".into()),
        ]
    }

    fn item_limit(&self) -> Option<usize> {
        Some(ITEM_LIMIT)
    }

    async fn process_batch(
        &mut self,
        batch: &[Record],
        settings: &EngineSettings,
    ) -> DeliveryOutcome {
        let Some(apikey) = Self::usable_apikey(settings) else {
            trace!(strategy = %self.name, "no usable api key, skipping send");
            return DeliveryOutcome::Skipped;
        };

        let post_url = format!("{}/input/bulk.json?apikey=", Self::base_url(settings));
        let body = format!("data={}&sentat={}", encode_batch(batch), unix_now());

        // Logged before the key is appended, so logs never carry the credential.
        info!(
            strategy = %self.name,
            url = %post_url,
            items = batch.len(),
            body = %body,
            "posting batch"
        );
        let post_url = format!("{post_url}{apikey}");

        match self.transport.send(&post_url, Some(body)).await {
            Ok(reply) if reply == ACK_TOKEN => {
                debug!(strategy = %self.name, reply = %reply, "receipt acknowledged");
                DeliveryOutcome::Delivered
            }
            Ok(reply) => {
                warn!(
                    strategy = %self.name,
                    reply = %reply,
                    "send failure: expected 'ok'"
                );
                DeliveryOutcome::Rejected
            }
            Err(e) => {
                warn!(strategy = %self.name, error = %e, "could not send to server");
                DeliveryOutcome::Rejected
            }
        }
    }

    fn announce_interval(&self, settings: &EngineSettings) -> Option<u64> {
        match settings.get("announce") {
            Some(mode) if mode == "myip" || mode == "hub" => {
                settings.get_u64("announce_interval")
            }
            _ => None,
        }
    }

    async fn periodic_task(&mut self, settings: &EngineSettings) -> bool {
        let mode = match settings.get("announce") {
            Some(mode) if mode == "myip" || mode == "hub" => mode,
            _ => return false,
        };

        let base = Self::base_url(settings);
        info!(strategy = %self.name, url = %base, mode = %mode, "announcing relay address");

        let apikey = settings.get("apikey").unwrap_or("");
        let mut announce_url = format!("{base}/{mode}/set.json?apikey={apikey}");
        if mode == "hub" {
            // TODO: make the hub id configurable
            announce_url.push_str(&format!("&hubid=Hub1&hubtime={}", unix_now()));
        }

        match self.transport.send(&announce_url, None).await {
            Ok(reply) if reply.contains(ANNOUNCE_CONFIRMATION) => {
                debug!(strategy = %self.name, reply = %reply, "address announce confirmed");
                true
            }
            Ok(reply) => {
                warn!(strategy = %self.name, reply = %reply, "address announce failed");
                false
            }
            Err(e) => {
                warn!(strategy = %self.name, error = %e, "address announce failed");
                false
            }
        }
    }
}
