//! FileBuffer - disk-backed FIFO surviving restarts
//!
//! Keeps the queue in memory and mirrors it to a JSON-lines snapshot after
//! every mutation, written to a temp file and renamed so a crash mid-write
//! leaves the previous snapshot intact.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use contracts::{Record, RecordBuffer};
use tracing::{info, warn};

/// Disk-backed pending-record buffer
pub struct FileBuffer {
    name: String,
    capacity: usize,
    path: PathBuf,
    items: VecDeque<Record>,
}

impl FileBuffer {
    /// Open a buffer, restoring any snapshot at `path`.
    ///
    /// A missing snapshot file is a fresh buffer; an unreadable one is a
    /// construction error.
    pub fn open(
        name: impl Into<String>,
        capacity: usize,
        path: &Path,
    ) -> Result<Self, io::Error> {
        let name = name.into();
        let items = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse_snapshot(&name, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => return Err(e),
        };

        if !items.is_empty() {
            info!(buffer = %name, restored = items.len(), "restored pending records from snapshot");
        }

        Ok(Self {
            name,
            capacity,
            path: path.to_path_buf(),
            items,
        })
    }

    fn parse_snapshot(name: &str, content: &str) -> VecDeque<Record> {
        let mut items = VecDeque::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<Record>(line) {
                Ok(record) => items.push_back(record),
                Err(e) => {
                    warn!(buffer = %name, error = %e, "skipping malformed snapshot line");
                }
            }
        }
        items
    }

    /// Mirror the queue to disk; failures are logged, never raised, so the
    /// buffer keeps serving from memory.
    fn persist(&self) {
        if let Err(e) = self.write_snapshot() {
            warn!(buffer = %self.name, error = %e, "failed to persist buffer snapshot");
        }
    }

    fn write_snapshot(&self) -> io::Result<()> {
        let mut content = String::new();
        for record in &self.items {
            let line = serde_json::to_string(record).map_err(io::Error::other)?;
            content.push_str(&line);
            content.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)
    }
}

impl RecordBuffer for FileBuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn store_item(&mut self, record: Record) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
            warn!(
                buffer = %self.name,
                capacity = self.capacity,
                "buffer full, oldest record dropped"
            );
        }
        self.items.push_back(record);
        self.persist();
    }

    fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn retrieve_items(&self, max_count: usize) -> Vec<Record> {
        self.items.iter().take(max_count).cloned().collect()
    }

    fn discard_oldest(&mut self, count: usize) {
        let count = count.min(self.items.len());
        self.items.drain(..count);
        self.persist();
    }
}
