//! Store module - JSON document persistence layer

mod document;
mod history;
mod presets;
mod settings;

pub use document::JsonDocument;
pub use history::{HistoryStore, MAX_HISTORY_ENTRIES};
pub use presets::PresetStore;
pub use settings::SettingsStore;
