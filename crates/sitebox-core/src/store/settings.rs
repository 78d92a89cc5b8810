//! Settings store

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use crate::error::Result;
use crate::store::JsonDocument;
use crate::types::{DownloadConfig, Settings};

/// Holds the single settings record
#[derive(Debug)]
pub struct SettingsStore {
    document: JsonDocument,
    settings: RwLock<Settings>,
}

impl SettingsStore {
    /// Open the store; without a document the defaults apply
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let document = JsonDocument::new(path);
        let settings: Settings = document.load()?.unwrap_or_default();

        Ok(Self {
            document,
            settings: RwLock::new(settings),
        })
    }

    pub fn get(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the settings wholesale and persist them
    pub fn save(&self, settings: Settings) -> Result<()> {
        let mut current = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        *current = settings;
        self.document.save(&*current)
    }

    /// Job configuration derived from the current settings
    pub fn default_config(&self) -> DownloadConfig {
        self.get().default_config()
    }
}
