use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the activity log (`~/.lms-console/activity.jsonl`).
///
/// One entry is written per API call, plus one per unexpected error caught
/// by the dashboard event loop. Read back by `lms-console activity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub method: String,
    pub path: String,
    /// HTTP status, absent when no response arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// `ok`, `unauthorized`, `error`, `network`, `decode` or `internal`.
    pub outcome: String,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Where activity entries go.
///
/// Cloned into every API client, including the ones owned by poller
/// threads. Appends are best-effort: a failed write never fails the request
/// that produced it.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// Log to `~/.lms-console/activity.jsonl` when `enabled`.
    pub fn from_config(enabled: bool) -> Self {
        if enabled {
            Self {
                path: default_log_path(),
            }
        } else {
            Self::disabled()
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Record the result of one API call.
    pub fn record_request(
        &self,
        method: &str,
        path: &str,
        status: Option<u16>,
        outcome: &str,
        latency_ms: u64,
        message: Option<&str>,
    ) {
        let entry = ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            method: method.to_string(),
            path: path.to_string(),
            status,
            outcome: outcome.to_string(),
            latency_ms,
            message: message.map(str::to_string),
        };

        let _ = self.append(&entry);
    }

    /// Record an unexpected failure caught at the top of the event loop.
    pub fn record_internal(&self, context: &str, message: &str) {
        self.record_request("-", context, None, "internal", 0, Some(message));
    }

    /// Read all entries, skipping malformed lines.
    ///
    /// Returns an empty vec if logging is disabled or the file is missing.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }

    /// The last `limit` entries, oldest first.
    pub fn read_recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = self.read_all();
        let excess = entries.len().saturating_sub(limit);
        entries.drain(..excess);
        entries
    }

    fn append(&self, entry: &ActivityEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        // One write per line keeps concurrent appends from interleaving.
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

/// Return the default activity log path.
pub fn default_log_path() -> Option<PathBuf> {
    crate::config::console_home().map(|dir| dir.join("activity.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
