//! Download history store

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::store::JsonDocument;
use crate::types::HistoryEntry;

/// Maximum number of entries kept; older ones are dropped first
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Capped log of finished jobs, persisted oldest-first
#[derive(Debug)]
pub struct HistoryStore {
    document: JsonDocument,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Open the store, loading the document at `path` if it exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let document = JsonDocument::new(path);
        let entries: Vec<HistoryEntry> = document.load()?.unwrap_or_default();

        Ok(Self {
            document,
            entries: RwLock::new(entries),
        })
    }

    /// All entries, newest first
    pub fn get_all(&self) -> Vec<HistoryEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().cloned().collect()
    }

    /// Look up an entry by identifier
    pub fn get(&self, id: &str) -> Result<HistoryEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("history entry {}", id)))
    }

    /// Append an entry, trim to the cap and persist.
    ///
    /// The entry stays in memory even when the write fails.
    pub fn add(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        entries.push(entry);
        if entries.len() > MAX_HISTORY_ENTRIES {
            let excess = entries.len() - MAX_HISTORY_ENTRIES;
            entries.drain(..excess);
        }

        self.document.save(&*entries)
    }

    /// Remove every entry and persist the empty log
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        self.document.save(&*entries)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
