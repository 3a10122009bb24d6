//! Rolling conversation memory and its on-disk snapshot.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MIN_MEMORY: usize = 5;
pub const MAX_MEMORY: usize = 50;
pub const DEFAULT_MEMORY: usize = 10;

const PROFILE_FILE: &str = "local_engine_profile.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Lowercased, trimmed user text.
    pub user: String,
    pub response: String,
    pub timestamp: NaiveDateTime,
}

impl MemoryEntry {
    pub fn new(user_text: &str, response: impl Into<String>) -> Self {
        Self {
            user: user_text.trim().to_lowercase(),
            response: response.into(),
            timestamp: chrono::Local::now().naive_local(),
        }
    }
}

/// Bounded FIFO of recent turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMemory {
    entries: VecDeque<MemoryEntry>,
    max: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY)
    }
}

impl ConversationMemory {
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max: max.clamp(MIN_MEMORY, MAX_MEMORY),
        }
    }

    pub fn push(&mut self, entry: MemoryEntry) {
        self.entries.push_back(entry);
        self.trim();
    }

    /// Clamp to `[5, 50]` and evict the oldest entries above the new bound.
    pub fn set_max(&mut self, max: usize) {
        self.max = max.clamp(MIN_MEMORY, MAX_MEMORY);
        self.trim();
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    /// Up to `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    fn replace(&mut self, entries: Vec<MemoryEntry>) {
        self.entries = entries.into();
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.max {
            self.entries.pop_front();
        }
    }
}

/// Persisted form: `{context_memory, user_profile, max_memory}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderSnapshot {
    pub context_memory: Vec<MemoryEntry>,
    pub user_profile: Map<String, Value>,
    pub max_memory: usize,
}

/// Snapshot as read from disk; absent fields leave current values untouched.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SnapshotPatch {
    pub context_memory: Option<Vec<MemoryEntry>>,
    pub user_profile: Option<Map<String, Value>>,
    pub max_memory: Option<usize>,
}

impl ConversationMemory {
    pub(crate) fn to_snapshot(&self, profile: &Map<String, Value>) -> ResponderSnapshot {
        ResponderSnapshot {
            context_memory: self.entries.iter().cloned().collect(),
            user_profile: profile.clone(),
            max_memory: self.max,
        }
    }

    /// Apply a loaded patch. Fields absent from the file keep their current values.
    pub(crate) fn apply_patch(&mut self, patch: SnapshotPatch, profile: &mut Map<String, Value>) {
        if let Some(max) = patch.max_memory {
            self.max = max.clamp(MIN_MEMORY, MAX_MEMORY);
        }
        if let Some(entries) = patch.context_memory {
            self.replace(entries);
        } else {
            self.trim();
        }
        if let Some(p) = patch.user_profile {
            *profile = p;
        }
    }
}

/// `<data_local_dir>/luna-assistant/local_engine_profile.json`, or `./user_data/` when the
/// platform has no data directory.
pub fn default_profile_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("luna-assistant"))
        .unwrap_or_else(|| PathBuf::from("user_data"))
        .join(PROFILE_FILE)
}

pub(crate) fn read_patch(path: &Path) -> Option<SnapshotPatch> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read local profile");
            return None;
        }
    };
    match serde_json::from_str::<SnapshotPatch>(&content) {
        Ok(p) => Some(p),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable local profile");
            None
        }
    }
}

/// Best-effort write; errors are logged and dropped.
pub(crate) fn write_snapshot(path: &Path, snapshot: &ResponderSnapshot) {
    match try_write(path, snapshot) {
        Ok(()) => debug!(path = %path.display(), "local profile saved"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to save local profile"),
    }
}

fn try_write(path: &Path, snapshot: &ResponderSnapshot) -> crate::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_eviction() {
        let mut mem = ConversationMemory::new(5);
        for i in 0..8 {
            mem.push(MemoryEntry::new(&format!("msg {i}"), "ok"));
        }
        assert_eq!(mem.len(), 5);
        let users: Vec<_> = mem.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(users, vec!["msg 3", "msg 4", "msg 5", "msg 6", "msg 7"]);
    }

    #[test]
    fn test_bounds_are_clamped() {
        assert_eq!(ConversationMemory::new(1).max(), 5);
        assert_eq!(ConversationMemory::new(99).max(), 50);

        let mut mem = ConversationMemory::new(20);
        for i in 0..20 {
            mem.push(MemoryEntry::new(&i.to_string(), "r"));
        }
        mem.set_max(6);
        assert_eq!(mem.len(), 6);
        assert_eq!(mem.iter().next().unwrap().user, "14");
    }

    #[test]
    fn test_entry_normalizes_user_text() {
        let e = MemoryEntry::new("  Hello THERE ", "hi");
        assert_eq!(e.user, "hello there");
    }

    #[test]
    fn test_patch_keeps_missing_fields() {
        let mut mem = ConversationMemory::new(12);
        mem.push(MemoryEntry::new("keep", "me"));
        let mut profile = Map::new();
        profile.insert("name".into(), Value::from("Sam"));

        let patch: SnapshotPatch = serde_json::from_str(r#"{"max_memory": 7}"#).unwrap();
        mem.apply_patch(patch, &mut profile);
        assert_eq!(mem.max(), 7);
        assert_eq!(mem.len(), 1);
        assert_eq!(profile["name"], "Sam");
    }

    #[test]
    fn test_reads_naive_iso_timestamps() {
        let json = r#"{"context_memory":[{"user":"hi","response":"Hello!","timestamp":"2024-05-01T10:20:30.123456"}]}"#;
        let patch: SnapshotPatch = serde_json::from_str(json).unwrap();
        assert_eq!(patch.context_memory.unwrap().len(), 1);
        assert!(patch.user_profile.is_none());
    }
}
