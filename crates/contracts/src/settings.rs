//! EngineSettings - hot-reloadable per-destination configuration
//!
//! A string map merged from built-in defaults and runtime overrides. The
//! merge is diffed so unchanged keys are not churned or re-logged, which
//! keeps repeated applies of the same configuration silent.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

/// Run-time pause flag, classified from the `pause` setting value.
///
/// Input pause is honored by whatever feeds the engine queue; the engine
/// itself gates output (flush) on `Output` and `Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseMode {
    /// Fully operational
    #[default]
    Off,
    /// No draining into the buffer, flush still runs
    Input,
    /// No flush, data keeps accumulating in the buffer
    Output,
    /// Neither draining nor flushing; buffer retained
    Full,
}

impl PauseMode {
    /// Classify a raw `pause` setting value.
    ///
    /// Unrecognized values (including empty/absent) mean "not paused".
    pub fn classify(value: &str) -> Self {
        match value {
            "i" | "I" | "in" | "In" | "IN" => Self::Input,
            "o" | "O" | "out" | "Out" | "OUT" => Self::Output,
            "t" | "T" | "true" | "True" | "TRUE" => Self::Full,
            _ => Self::Off,
        }
    }

    /// Whether the engine may drain its inbound queue
    pub fn allows_input(&self) -> bool {
        matches!(self, Self::Off | Self::Output)
    }

    /// Whether the engine may flush the buffer
    pub fn allows_output(&self) -> bool {
        matches!(self, Self::Off | Self::Input)
    }
}

/// Base defaults every engine starts from; strategies extend these.
const BASE_DEFAULTS: &[(&str, &str)] = &[
    ("pause", ""),
    ("interval", "0"),
    ("max_items_per_post", "1"),
];

/// Per-destination settings with two-pass diff-merge semantics.
///
/// Pass one resolves every recognized (defaulted) key to the explicit
/// override when present, else the default, applying and logging only actual
/// changes. Pass two applies override keys outside the recognized set (e.g.
/// credentials) unconditionally when changed; values of such keys are never
/// logged.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    defaults: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
}

impl EngineSettings {
    /// Create settings seeded with the base defaults
    pub fn new() -> Self {
        let defaults: BTreeMap<String, String> = BASE_DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        // Seeding values with the defaults keeps startup from logging every
        // default as a "change".
        let values = defaults.clone();
        Self { defaults, values }
    }

    /// Merge strategy-specific defaults on top of the base set.
    ///
    /// Called once at engine construction, before the first `apply`.
    pub fn extend_defaults(&mut self, extra: Vec<(String, String)>) {
        for (key, value) in extra {
            self.values.insert(key.clone(), value.clone());
            self.defaults.insert(key, value);
        }
    }

    /// Apply runtime overrides. Returns the number of keys that changed.
    pub fn apply(&mut self, engine: &str, overrides: &HashMap<String, String>) -> usize {
        let mut changed = 0;

        // Pass one: recognized keys resolve to override-or-default.
        let recognized: Vec<(String, String)> = self
            .defaults
            .iter()
            .map(|(key, default)| {
                let effective = overrides.get(key).unwrap_or(default).clone();
                (key.clone(), effective)
            })
            .collect();
        for (key, effective) in recognized {
            if self.values.get(&key) != Some(&effective) {
                debug!(engine, key = %key, value = %effective, "setting changed");
                self.values.insert(key, effective);
                changed += 1;
            }
        }

        // Pass two: destination-specific keys (e.g. apikey). Values are
        // intentionally kept out of the logs.
        for (key, value) in overrides {
            if self.defaults.contains_key(key) {
                continue;
            }
            if self.values.get(key) != Some(value) {
                debug!(engine, key = %key, "destination-specific setting changed");
                self.values.insert(key.clone(), value.clone());
                changed += 1;
            }
        }

        changed
    }

    /// Raw value lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse a value as u64; `None` when absent or unparsable
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Current pause classification
    pub fn pause(&self) -> PauseMode {
        PauseMode::classify(self.get("pause").unwrap_or(""))
    }

    /// Minimum seconds between flushes; 0 disables rate limiting
    pub fn interval_secs(&self) -> u64 {
        self.get_u64("interval").unwrap_or(0)
    }

    /// Configured batch size; values <= 0 disable flushing entirely
    pub fn max_items_per_post(&self) -> i64 {
        self.get("max_items_per_post")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new()
    }
}
