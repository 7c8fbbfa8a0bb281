//! Session log for the active bridge run.
//!
//! Keeps a ring buffer of the current run and broadcasts every entry plus the
//! reveal/clear signals to subscribers (a terminal printer, an editor panel).
//! Every entry is mirrored into `tracing` so the session log is never the only
//! trace of a failure.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use probebridge_core::{LogChannelPort, LogLevel};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Maximum number of entries kept for the active run.
const MAX_LOG_LINES: usize = 5000;

/// Capacity of the subscriber broadcast channel.
const BROADCAST_CAPACITY: usize = 1000;

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Supervisor(LogLevel),
    Bridge,
}

/// A single line of the session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub source: EntrySource,
    pub line: String,
}

impl SessionLogEntry {
    fn new(source: EntrySource, line: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            source,
            line: line.to_string(),
        }
    }

    /// Text as shown to the user.
    pub fn render(&self) -> String {
        match self.source {
            EntrySource::Bridge => self.line.clone(),
            EntrySource::Supervisor(level) => format!("[{level:>5}] {}", self.line),
        }
    }
}

/// What subscribers receive.
#[derive(Debug, Clone)]
pub enum SessionLogEvent {
    Entry(SessionLogEntry),
    Reveal,
    Cleared,
}

/// In-memory [`LogChannelPort`] implementation.
pub struct SessionLog {
    lines: Mutex<VecDeque<SessionLogEntry>>,
    events: broadcast::Sender<SessionLogEvent>,
    reveals: AtomicUsize,
}

impl SessionLog {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)),
            events,
            reveals: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionLogEvent> {
        self.events.subscribe()
    }

    /// All entries of the current run.
    pub fn entries(&self) -> Vec<SessionLogEntry> {
        self.buffer().iter().cloned().collect()
    }

    /// Rendered text of the current run.
    pub fn lines(&self) -> Vec<String> {
        self.buffer().iter().map(SessionLogEntry::render).collect()
    }

    /// How many times the log was revealed since creation.
    pub fn reveal_count(&self) -> usize {
        self.reveals.load(Ordering::SeqCst)
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<SessionLogEntry>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, entry: SessionLogEntry) {
        {
            let mut lines = self.buffer();
            if lines.len() >= MAX_LOG_LINES {
                lines.pop_front();
            }
            lines.push_back(entry.clone());
        }
        // Broadcast to subscribers (ignore if no receivers)
        let _ = self.events.send(SessionLogEvent::Entry(entry));
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogChannelPort for SessionLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(target: "probebridge::session", "{message}"),
            LogLevel::Warn => warn!(target: "probebridge::session", "{message}"),
            LogLevel::Error => error!(target: "probebridge::session", "{message}"),
        }
        self.push(SessionLogEntry::new(EntrySource::Supervisor(level), message));
    }

    fn write_line(&self, line: &str) {
        debug!(target: "probebridge::bridge", "{line}");
        self.push(SessionLogEntry::new(EntrySource::Bridge, line));
    }

    fn reveal(&self) {
        self.reveals.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.send(SessionLogEvent::Reveal);
    }

    fn clear(&self) {
        self.buffer().clear();
        let _ = self.events.send(SessionLogEvent::Cleared);
    }
}
