//! Whole-document JSON persistence

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// A JSON file holding one complete collection or record.
///
/// Every save serializes the full value into a temporary file next to
/// the target and renames it over the target. The rename replaces the
/// document in one step on the same filesystem, but the parent directory
/// is not synced, so a crash right after a save may still surface the
/// previous version.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document. A missing file yields `None`.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No document at {:?}, starting empty", self.path);
                return Ok(None);
            }
            Err(e) => return Err(self.error("read", e)),
        };

        let value = serde_json::from_str(&content).map_err(|e| self.error("parse", e))?;
        log::info!("Loaded {:?}", self.path);
        Ok(Some(value))
    }

    /// Serialize `value` and replace the document with it
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let content =
            serde_json::to_string_pretty(value).map_err(|e| self.error("serialize", e))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.error("create", e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.flush())
            .and_then(|_| tmp.as_file_mut().sync_all())
            .map_err(|e| self.error("write", e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.error("replace", e.error))?;

        log::debug!("Saved {:?}", self.path);
        Ok(())
    }

    fn error(&self, action: &str, err: impl std::fmt::Display) -> Error {
        Error::Persistence(format!("failed to {} {:?}: {}", action, self.path, err))
    }
}
