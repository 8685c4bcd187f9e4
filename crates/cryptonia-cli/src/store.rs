//! # Local State Store
//!
//! The CLI keeps the registry as a JSON snapshot in the state directory and
//! appends every committed lifecycle event to a JSON-lines audit log.
//!
//! ```text
//! <state_dir>/
//! ├── .lock           held exclusively by the session using the directory
//! ├── registry.json   RegistrySnapshot, rewritten after each mutation
//! └── events.jsonl    one LifecycleEvent per line, append-only
//! ```
//!
//! Concurrent invocations against one directory queue on `.lock`, so each
//! one loads the snapshot its predecessor committed.
//!
//! Events are buffered by [`AuditLogSink`] and only written once the
//! snapshot that contains their effect has been saved.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use parking_lot::Mutex;
use tempfile::NamedTempFile;

use cryptonia_state::{
    CredentialRegistry, EventSink, LifecycleEvent, RegistrySnapshot, TracingSink,
};

/// Snapshot file name inside the state directory.
pub const REGISTRY_FILE: &str = "registry.json";

/// Audit log file name inside the state directory.
pub const EVENTS_FILE: &str = "events.jsonl";

/// Advisory lock file inside the state directory.
pub const LOCK_FILE: &str = ".lock";

/// Exclusive hold on a state directory. Released when dropped.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

/// Filesystem layout for persisted CLI state.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Store rooted at `dir`. Nothing is created until it is locked or saved.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The state directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the registry snapshot.
    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(REGISTRY_FILE)
    }

    /// Path of the audit log.
    pub fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    /// Take the exclusive lock on the state directory, creating it if needed.
    ///
    /// Blocks while another process or session holds the lock.
    pub fn lock(&self) -> Result<StateLock> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create state directory {}", self.dir.display()))?;
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        tracing::debug!(path = %path.display(), "acquiring state lock");
        file.lock_exclusive()
            .with_context(|| format!("failed to lock {}", path.display()))?;
        Ok(StateLock { _file: file })
    }

    /// Load the registry, or an empty one when no snapshot exists yet.
    ///
    /// A snapshot that violates a registry invariant is refused rather than
    /// repaired.
    pub fn load(&self) -> Result<CredentialRegistry> {
        let path = self.registry_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no registry snapshot; starting empty");
            return Ok(CredentialRegistry::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let snapshot: RegistrySnapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        let registry = CredentialRegistry::from_snapshot(snapshot)
            .with_context(|| format!("corrupt registry snapshot {}", path.display()))?;
        tracing::debug!(live = registry.len(), "loaded registry snapshot");
        Ok(registry)
    }

    /// Write the snapshot atomically through a uniquely named temp file.
    pub fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create state directory {}", self.dir.display()))?;
        let path = self.registry_path();
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("failed to create temp file in {}", self.dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.as_file()
            .sync_all()
            .context("failed to flush registry snapshot")?;
        tmp.persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Append events to the audit log, one JSON object per line.
    pub fn append_events(&self, events: &[LifecycleEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create state directory {}", self.dir.display()))?;
        let path = self.events_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        for event in events {
            let line = serde_json::to_string(event)?;
            writeln!(file, "{line}").with_context(|| format!("failed to append to {}", path.display()))?;
        }
        Ok(())
    }

    /// Read the audit log back.
    pub fn read_events(&self) -> Result<Vec<LifecycleEvent>> {
        let path = self.events_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("{}: bad event on line {}", path.display(), n + 1))
            })
            .collect()
    }
}

/// Event sink that logs through `tracing` and holds events until the
/// caller persists them with [`StateStore::append_events`].
#[derive(Debug, Default)]
pub struct AuditLogSink {
    pending: Mutex<Vec<LifecycleEvent>>,
}

impl AuditLogSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain buffered events.
    pub fn drain(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl EventSink for AuditLogSink {
    fn emit(&self, event: &LifecycleEvent) {
        TracingSink.emit(event);
        self.pending.lock().push(event.clone());
    }
}
