//! Append-only durable event store (spec.md §4.1).
//!
//! Invariant E1 (append-only): nothing here ever rewrites a line already on
//! disk. Invariant E3 (durability): `append` does not return `Ok` until the
//! write has been flushed *and* `sync_all`'d.
//!
//! File IO is synchronous underneath an async `Mutex`: a single mission's
//! event traffic is low-frequency enough (one append per causally
//! meaningful step) that blocking the executor briefly inside the lock is
//! preferable to threading a background writer through every call site,
//! matching the cooperative single-process scheduling model of spec.md §5.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use corestack_protocol::Event;
use corestack_protocol::EventType;
use snafu::ResultExt;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;

use crate::error::event_log_error::AppendSnafu;
use crate::error::event_log_error::CorruptSnafu;
use crate::error::EventLogError;
use crate::error::event_log_error::OpenSnafu;
use crate::error::event_log_error::SerializeSnafu;

struct Inner {
    file: File,
    events: Vec<Event>,
}

/// The exclusive owner of the on-disk log (spec.md §5 "Shared-resource
/// policy"): only `EventBus::publish` is expected to call [`EventStore::append`].
pub struct EventStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl EventStore {
    /// Open (creating if absent) the log at `path`, replaying every
    /// existing line into memory. A parse failure on any line is fatal,
    /// per spec.md §4.1.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, EventLogError> {
        let path = path.into();
        let events = Self::load_existing(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|_| OpenSnafu {
                path: path.display().to_string(),
            })?;
        info!(path = %path.display(), loaded = events.len(), "event log opened");
        Ok(Self {
            path,
            inner: Mutex::new(Inner { file, events }),
        })
    }

    fn load_existing(path: &Path) -> Result<Vec<Event>, EventLogError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path).with_context(|_| OpenSnafu {
            path: path.display().to_string(),
        })?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line = line.with_context(|_| OpenSnafu {
                path: path.display().to_string(),
            })?;
            if line.is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line).with_context(|_| CorruptSnafu {
                path: path.display().to_string(),
                line_number,
            })?;
            events.push(event);
        }
        Ok(events)
    }

    /// Append `event`, returning only after the durability barrier
    /// completes (invariant E3).
    pub async fn append(&self, event: Event) -> Result<(), EventLogError> {
        let mut line = serde_json::to_string(&event).with_context(|_| SerializeSnafu {
            event_id: event.event_id.clone(),
        })?;
        line.push('\n');

        let mut inner = self.inner.lock().await;
        inner
            .file
            .write_all(line.as_bytes())
            .with_context(|_| AppendSnafu {
                path: self.path.display().to_string(),
            })?;
        inner.file.flush().with_context(|_| AppendSnafu {
            path: self.path.display().to_string(),
        })?;
        inner.file.sync_all().with_context(|_| AppendSnafu {
            path: self.path.display().to_string(),
        })?;
        debug!(event_id = %event.event_id, task_id = %event.task_id, event_type = %event.event_type(), "event appended");
        inner.events.push(event);
        Ok(())
    }

    /// Every event ever appended, in append order. A defensive copy: the
    /// in-memory list is never exposed by reference.
    pub async fn get_all(&self) -> Vec<Event> {
        self.inner.lock().await.events.clone()
    }

    pub async fn get_by_task(&self, task_id: &str) -> Vec<Event> {
        self.inner
            .lock()
            .await
            .events
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect()
    }

    pub async fn get_by_type(&self, event_type: EventType) -> Vec<Event> {
        self.inner
            .lock()
            .await
            .events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .cloned()
            .collect()
    }

    pub async fn get_by_id(&self, event_id: &str) -> Option<Event> {
        self.inner
            .lock()
            .await
            .events
            .iter()
            .find(|e| e.event_id == event_id)
            .cloned()
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.events.len()
    }
}

#[cfg(test)]
#[path = "store.test.rs"]
mod tests;
