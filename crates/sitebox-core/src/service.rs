//! App service - the operations a presentation layer calls
//!
//! `App` is created once at startup and owns the job manager and the three
//! record stores. Job notifications reach the presentation layer through
//! the `UiMessage` receiver returned by [`App::startup`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::engine::EngineFactory;
use crate::error::{Error, Result};
use crate::manager::{DownloadManager, JobId};
use crate::store::{HistoryStore, PresetStore, SettingsStore};
use crate::types::{DownloadConfig, HistoryEntry, Preset, ProgressEvent, Settings};

pub const HISTORY_FILE: &str = "history.json";
pub const PRESETS_FILE: &str = "presets.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Capacity of the UI channel; messages beyond it are dropped
pub const UI_CHANNEL_CAPACITY: usize = 256;

/// Messages sent from running jobs to the UI (via channel)
#[derive(Debug, Clone)]
pub enum UiMessage {
    /// Engine progress notification of the active job
    Progress { job_id: JobId, event: ProgressEvent },
    /// A job finished and was written to history
    JobFinished { job_id: JobId, entry: HistoryEntry },
    /// The engine reported an error for a job
    JobFailed { job_id: JobId, message: String },
}

/// Get the platform config directory for SiteBox
pub fn get_config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("sitebox"),
        None => {
            log::warn!("No config directory available, using the working directory");
            PathBuf::from(".")
        }
    }
}

/// Application context: job manager plus record stores
pub struct App {
    config_dir: PathBuf,
    downloads: DownloadManager,
    history: Arc<HistoryStore>,
    presets: PresetStore,
    settings: SettingsStore,
}

impl App {
    /// Load the stores from `config_dir` and set up the job manager.
    ///
    /// Must be called from within a tokio runtime; jobs are spawned on it.
    pub fn startup(
        config_dir: impl Into<PathBuf>,
        factory: Arc<dyn EngineFactory>,
    ) -> Result<(Self, async_channel::Receiver<UiMessage>)> {
        let config_dir = config_dir.into();
        std::fs::create_dir_all(&config_dir).map_err(|e| {
            log::error!("Failed to create config directory {:?}: {}", config_dir, e);
            Error::Persistence(format!(
                "failed to create config directory {:?}: {}",
                config_dir, e
            ))
        })?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Runtime(format!("no tokio runtime: {}", e)))?;

        let history = Arc::new(HistoryStore::open(config_dir.join(HISTORY_FILE))?);
        let presets = PresetStore::open(config_dir.join(PRESETS_FILE))?;
        let settings = SettingsStore::open(config_dir.join(SETTINGS_FILE))?;

        let (ui_sender, ui_receiver) = async_channel::bounded(UI_CHANNEL_CAPACITY);
        let downloads = DownloadManager::new(factory, history.clone(), ui_sender, runtime);

        log::info!("SiteBox started, config dir: {:?}", config_dir);

        Ok((
            Self {
                config_dir,
                downloads,
                history,
                presets,
                settings,
            },
            ui_receiver,
        ))
    }

    /// Start up in the platform config directory
    pub fn startup_default(
        factory: Arc<dyn EngineFactory>,
    ) -> Result<(Self, async_channel::Receiver<UiMessage>)> {
        Self::startup(get_config_dir(), factory)
    }

    /// Stop any running job before the process exits
    pub fn shutdown(&self) {
        self.downloads.stop();
        log::info!("SiteBox shutting down");
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    // Downloads

    pub fn start_download(&self, config: DownloadConfig) -> Result<()> {
        self.downloads.start(config)
    }

    pub fn stop_download(&self) {
        self.downloads.stop();
    }

    pub fn validate_config(&self, config: &DownloadConfig) -> Result<()> {
        self.downloads.validate(config)
    }

    pub fn is_running(&self) -> bool {
        self.downloads.is_running()
    }

    pub fn current_job_id(&self) -> Option<JobId> {
        self.downloads.current_job_id()
    }

    pub fn current_config(&self) -> Option<DownloadConfig> {
        self.downloads.current_config()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.downloads.started_at()
    }

    // History

    /// History entries, newest first
    pub fn get_history(&self) -> Vec<HistoryEntry> {
        self.history.get_all()
    }

    pub fn clear_history(&self) -> Result<()> {
        self.history.clear()
    }

    /// Configuration of a past job, to run it again
    pub fn rerun_from_history(&self, id: &str) -> Result<DownloadConfig> {
        self.history.get(id).map(|entry| entry.config)
    }

    // Presets

    pub fn get_presets(&self) -> Vec<Preset> {
        self.presets.get_all()
    }

    pub fn save_preset(&self, name: &str, config: DownloadConfig) -> Result<Preset> {
        self.presets.save(name, config)
    }

    pub fn load_preset(&self, id: &str) -> Result<DownloadConfig> {
        self.presets.get(id).map(|preset| preset.config)
    }

    pub fn delete_preset(&self, id: &str) -> Result<()> {
        self.presets.delete(id)
    }

    // Settings

    pub fn get_settings(&self) -> Settings {
        self.settings.get()
    }

    pub fn save_settings(&self, settings: Settings) -> Result<()> {
        self.settings.save(settings)
    }

    /// Job configuration seeded from the settings
    pub fn get_default_config(&self) -> DownloadConfig {
        self.settings.default_config()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.downloads.stop();
    }
}
