//! Preset store

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use crate::error::{Error, Result};
use crate::id::generate_id;
use crate::store::JsonDocument;
use crate::types::{DownloadConfig, Preset};

/// Named configurations in insertion order
#[derive(Debug)]
pub struct PresetStore {
    document: JsonDocument,
    presets: RwLock<Vec<Preset>>,
}

impl PresetStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let document = JsonDocument::new(path);
        let presets: Vec<Preset> = document.load()?.unwrap_or_default();

        Ok(Self {
            document,
            presets: RwLock::new(presets),
        })
    }

    pub fn get_all(&self) -> Vec<Preset> {
        self.presets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &str) -> Result<Preset> {
        let presets = self.presets.read().unwrap_or_else(PoisonError::into_inner);
        presets
            .iter()
            .find(|preset| preset.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("preset {}", id)))
    }

    /// Store `config` under `name` with a fresh identifier.
    ///
    /// Names need not be unique. The preset is kept in memory even when
    /// the write fails.
    pub fn save(&self, name: &str, config: DownloadConfig) -> Result<Preset> {
        let preset = Preset {
            id: generate_id(),
            name: name.to_string(),
            created_at: Utc::now(),
            config,
        };

        let mut presets = self.presets.write().unwrap_or_else(PoisonError::into_inner);
        presets.push(preset.clone());
        self.document.save(&*presets)?;

        log::info!("Saved preset '{}' ({})", preset.name, preset.id);
        Ok(preset)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let mut presets = self.presets.write().unwrap_or_else(PoisonError::into_inner);
        let index = presets
            .iter()
            .position(|preset| preset.id == id)
            .ok_or_else(|| Error::NotFound(format!("preset {}", id)))?;

        presets.remove(index);
        self.document.save(&*presets)
    }

    pub fn len(&self) -> usize {
        self.presets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
