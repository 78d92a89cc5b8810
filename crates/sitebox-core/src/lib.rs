//! SiteBox Core Library
//!
//! This crate coordinates site download jobs run by an external engine,
//! relays their progress, and persists job history, presets and settings
//! as JSON documents. It is UI-agnostic and can be used with any frontend.

pub mod engine;
pub mod error;
pub mod id;
pub mod manager;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use engine::{
    engine_options, EngineError, EngineEvent, EngineEventKind, EngineFactory, EngineOptions,
    ProgressSink, SiteEngine,
};
pub use error::{Error, Result};
pub use id::generate_id;
pub use manager::{DownloadManager, JobId};
pub use service::{get_config_dir, App, UiMessage};
pub use store::{HistoryStore, JsonDocument, PresetStore, SettingsStore, MAX_HISTORY_ENTRIES};
pub use types::*;
pub use utils::extract_domain;

// Re-export the cancellation token engines receive
pub use tokio_util::sync::CancellationToken;
