//! Key-value backends for the session.
//!
//! [`FileStore`] keeps a flat JSON object on disk so the session survives
//! between `lms-console` invocations. [`MemoryStore`] is the same contract
//! without persistence, used by tests and throwaway sessions.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;

/// Synchronous string key-value storage shared across threads.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// JSON file store, e.g. `~/.lms-console/session.json`.
///
/// Every call re-reads the file, so two console processes see each other's
/// writes on their next access. An unreadable or malformed file reads as
/// empty.
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the original, so a reader never sees a truncated file. The file
/// holds the bearer token and is created owner-only on Unix.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(map).context("failed to serialize session")?;

        let temp_path = self.temp_path();
        if let Err(e) = write_private(&temp_path, json.as_bytes()) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("failed to write {}", temp_path.display()));
        }
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("failed to replace {}", self.path.display()));
        }
        Ok(())
    }

    /// Per-process temp name so two consoles never share one.
    fn temp_path(&self) -> PathBuf {
        self.path.with_extension(format!("json.{}.tmp", std::process::id()))
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map();
        apply(&mut map);
        self.write_map(&map)
    }
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    // A leftover from a crashed write would keep its old permissions.
    let _ = fs::remove_file(path);

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|map| {
            map.remove(key);
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
