//! Types module - data structures for SiteBox
//!
//! These types define the records exchanged with the presentation layer
//! and written to the JSON documents. Field names serialize in camelCase.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::extract_domain;

/// URL prefixes every default configuration excludes from the crawl
pub const DEFAULT_BLACKLIST: &[&str] = &["https://github"];

/// Style, script and font extensions fetched by default
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".css", ".woff2", ".woff", ".ttf"];

/// Image extensions fetched when images are enabled
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &[".png", ".svg", ".jpg", ".jpeg", ".gif", ".webp"];

/// Configuration of one site download job
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadConfig {
    pub url: String,
    pub domain: String,
    pub output: String,
    pub max_depth: i32,
    pub concurrent: i32,
    pub retries: i32,
    pub include_images: bool,
    /// URL prefixes the engine must not follow
    pub blacklist: Vec<String>,
    /// Asset extensions the engine downloads besides pages
    pub extensions: Vec<String>,
    pub image_extensions: Vec<String>,
}

impl DownloadConfig {
    /// Fill a blank domain from the URL's scheme and host
    pub fn with_domain_from_url(mut self) -> Self {
        if self.domain.trim().is_empty() {
            self.domain = extract_domain(&self.url);
        }
        self
    }

    /// Check that the configuration is well formed.
    ///
    /// Touches nothing but the filesystem metadata of `output`.
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(Error::Validation("url: must not be empty".into()));
        }
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(Error::Validation(format!(
                    "url: unsupported scheme '{}'",
                    parsed.scheme()
                )))
            }
            Err(e) => return Err(Error::Validation(format!("url: {}", e))),
        }

        if self.domain.trim().is_empty() {
            return Err(Error::Validation("domain: must not be empty".into()));
        }

        if self.output.trim().is_empty() {
            return Err(Error::Validation("output: must not be empty".into()));
        }
        let output = Path::new(&self.output);
        if output.exists() && !output.is_dir() {
            return Err(Error::Validation(format!(
                "output: {} is not a directory",
                self.output
            )));
        }

        for (field, value) in [
            ("maxDepth", self.max_depth),
            ("concurrent", self.concurrent),
            ("retries", self.retries),
        ] {
            if value < 0 {
                return Err(Error::Validation(format!(
                    "{}: must not be negative (got {})",
                    field, value
                )));
            }
        }

        Ok(())
    }
}

/// Kind of a progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Start,
    Download,
    Error,
    Complete,
}

impl std::fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressKind::Start => write!(f, "start"),
            ProgressKind::Download => write!(f, "download"),
            ProgressKind::Error => write!(f, "error"),
            ProgressKind::Complete => write!(f, "complete"),
        }
    }
}

/// Progress notification forwarded to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub url: String,
    pub file_path: String,
    pub downloaded: u64,
    pub errors: u64,
    pub message: String,
}

/// Final status of a finished job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Error,
    Stopped,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Record of one finished job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub url: String,
    pub domain: String,
    pub output: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub downloaded: u64,
    pub errors: u64,
    pub status: JobStatus,
    pub config: DownloadConfig,
}

/// Named, reusable configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub config: DownloadConfig,
}

/// Color theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub default_output: String,
    pub default_concurrent: i32,
    pub default_max_depth: i32,
    pub default_retries: i32,
    pub include_images: bool,
    pub show_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            default_output: String::new(),
            default_concurrent: 5,
            default_max_depth: 50,
            default_retries: 3,
            include_images: false,
            show_notifications: true,
        }
    }
}

impl Settings {
    /// Job configuration seeded from these settings and the fixed defaults
    pub fn default_config(&self) -> DownloadConfig {
        DownloadConfig {
            url: String::new(),
            domain: String::new(),
            output: self.default_output.clone(),
            max_depth: self.default_max_depth,
            concurrent: self.default_concurrent,
            retries: self.default_retries,
            include_images: self.include_images,
            blacklist: to_strings(DEFAULT_BLACKLIST),
            extensions: to_strings(DEFAULT_EXTENSIONS),
            image_extensions: to_strings(DEFAULT_IMAGE_EXTENSIONS),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
